use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref QUIZ_QUESTIONS_CNTR: CounterVec = register_counter_vec!(
        "trivia_quiz_questions_served_total",
        "Number of questions served to quiz players",
        &["category"]
    )
    .unwrap();
    pub static ref CREATED_QUESTIONS_CNTR: Counter = register_counter!(
        "trivia_questions_created_total",
        "Number of questions created through the API"
    )
    .unwrap();
    pub static ref DELETED_QUESTIONS_CNTR: Counter = register_counter!(
        "trivia_questions_deleted_total",
        "Number of questions deleted through the API"
    )
    .unwrap();
}

/// Directives used when `LOG_LEVEL` is unset or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn,tower_http=debug";

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_tracing() {
    let directives = std::env::var("LOG_LEVEL").ok();
    let span_events = std::env::var("INCLUDE_SPAN_EVENTS")
        .is_ok_and(|value| value.eq_ignore_ascii_case("true"));

    let fmt_layer = fmt::layer().with_target(true).with_span_events(if span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    });

    let installed = tracing_subscriber::registry()
        .with(log_filter(directives.as_deref()))
        .with(fmt_layer)
        .try_init();
    if let Err(e) = installed {
        tracing::debug!("Tracing already initialised: {e}");
    }
}
