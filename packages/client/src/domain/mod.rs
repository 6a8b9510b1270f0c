//! ドメイン層
//!
//! 外部 I/O を持たない型と純粋関数、および Infrastructure 層が実装する
//! ポート（trait）を定義します。

pub mod connection;
pub mod dedup;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod latency;
pub mod quality;
pub mod quiz;
pub mod repository;
pub mod roster;
pub mod transport;
pub mod value_object;

pub use connection::{ConnectionState, SocketId, SocketStatus};
pub use dedup::{OfferOutcome, QuizDeduplicator};
pub use error::{GatewayError, StorageError, TransportError, ValueObjectError};
pub use gateway::{LatencyApi, LatencyReport, ProbeEcho, QuizApi};
pub use identity::{ParticipantIdentity, Role};
pub use latency::{LatencySample, LatencyWindow, QualityStats};
pub use quality::{QualityBand, classify};
pub use quiz::{QuizEvent, QuizSource};
pub use repository::{ACTIVE_SESSION_STORAGE_KEY, KeyValueStore};
pub use roster::{RosterChange, RosterUpdate};
pub use transport::{ChannelAddress, Connector, HEARTBEAT_PING, HEARTBEAT_PONG, Transport};
pub use value_object::{ParticipantId, SessionKey};
