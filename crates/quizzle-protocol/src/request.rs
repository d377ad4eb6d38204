//! Session-channel requests: one ASCII command per line, opcode first.
//!
//! The client writes lines like `0 alice secret 7001`; the first field
//! is the numeric opcode, the rest are its space-separated arguments.
//! Trailing fields beyond what an opcode needs are ignored, missing
//! ones are an error.

use crate::ProtocolError;

/// Opcode constants, in wire order.
const OP_LOGIN: u8 = 0;
const OP_LOGOUT: u8 = 1;
const OP_ADD_FRIEND: u8 = 2;
const OP_FRIEND_LIST: u8 = 3;
const OP_SCORE: u8 = 4;
const OP_SCOREBOARD: u8 = 5;
const OP_MATCH: u8 = 6;

/// A parsed session-channel request.
///
/// One variant per opcode:
///
/// | Op | Variant | Arguments |
/// |----|---------|-----------|
/// | 0  | `Login` | nickname, password, UDP port |
/// | 1  | `Logout` | — |
/// | 2  | `AddFriend` | friend nickname |
/// | 3  | `FriendList` | — |
/// | 4  | `Score` | — |
/// | 5  | `Scoreboard` | — |
/// | 6  | `Match` | friend nickname |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login {
        nickname: String,
        password: String,
        udp_port: u16,
    },
    Logout,
    AddFriend {
        nickname: String,
    },
    FriendList,
    Score,
    Scoreboard,
    Match {
        nickname: String,
    },
}

impl Request {
    /// Parses one request line.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] describing the first thing wrong with
    /// the line: empty input, a non-numeric or unknown opcode, a missing
    /// argument, or an out-of-range UDP port.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut fields = line.split_whitespace();

        let opcode = fields.next().ok_or(ProtocolError::EmptyRequest)?;
        let opcode: u8 = opcode
            .parse()
            .map_err(|_| ProtocolError::BadOpcode(opcode.to_string()))?;

        let mut arg = |field: &'static str| {
            fields
                .next()
                .map(str::to_string)
                .ok_or(ProtocolError::MissingArgument { opcode, field })
        };

        match opcode {
            OP_LOGIN => {
                let nickname = arg("nickname")?;
                let password = arg("password")?;
                let port = arg("udp port")?;
                let udp_port = port
                    .parse()
                    .map_err(|_| ProtocolError::InvalidPort(port))?;
                Ok(Self::Login {
                    nickname,
                    password,
                    udp_port,
                })
            }
            OP_LOGOUT => Ok(Self::Logout),
            OP_ADD_FRIEND => Ok(Self::AddFriend {
                nickname: arg("friend nickname")?,
            }),
            OP_FRIEND_LIST => Ok(Self::FriendList),
            OP_SCORE => Ok(Self::Score),
            OP_SCOREBOARD => Ok(Self::Scoreboard),
            OP_MATCH => Ok(Self::Match {
                nickname: arg("friend nickname")?,
            }),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
