// self
use crate::{_prelude::*, obs::FlowKind};

/// Authorize, callback, or refresh future running inside its `oauth2_route.flow` span.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// The bare flow future; nothing is attached without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span wrapping one pass through the redirect, the callback exchange, or a refresh.
///
/// `stage` names the entry point (`start_authorization`, `complete_authorization`, `refresh`) so a
/// callback that fails state validation can be told apart from one whose code exchange failed.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens an `oauth2_route.flow` span labeled with `kind` and `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_route.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs `fut` inside the span; the token exchange awaits the provider without an entered guard.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning event describing a failed flow.
///
/// Only the error's `Display` text and HTTP status are logged; neither includes secrets.
pub fn record_flow_error(kind: FlowKind, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			flow = kind.as_str(),
			status = error.status_code().as_u16(),
			error = %error,
			"OAuth flow failed."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, error);
	}
}

/// Emits an error event for host wiring problems that make the route unusable.
pub fn record_misconfiguration(error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(error = %error, "OAuth route is misconfigured.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn error_events_accept_every_class() {
		record_flow_error(FlowKind::Refresh, &Error::InvalidState);
		record_misconfiguration(&crate::error::ConfigError::SessionUnavailable.into());
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
