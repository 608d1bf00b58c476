// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counter bumped once per authorize, callback, or refresh outcome.
pub const FLOW_COUNTER: &str = "oauth2_route_flow_total";

/// Bumps [`FLOW_COUNTER`] for one step of the redirect, callback, or refresh flow.
///
/// Every flow records an `attempt` on entry and exactly one of `success` or `failure` when it
/// returns, labeled by `flow` and `outcome`. A callback with a mismatched state therefore shows up
/// as `flow="callback", outcome="failure"` without a token exchange behind it. Without the
/// `metrics` feature this compiles to nothing.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(FLOW_COUNTER, "flow" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
