/// Storm alerting.
///
/// - `notification` — lifecycle of the single outstanding storm notification.
/// - `stalenesses` — rejects samples too old to compare.

pub mod notification;
pub mod stalenesses;
