pub mod error;
pub mod profile;
pub mod session;
pub mod stream;

pub use error::{AgentError, Result};
pub use profile::AgentProfile;
pub use session::{AgentSession, TurnOutcome};
pub use stream::TurnStream;
