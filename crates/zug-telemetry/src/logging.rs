//! Structured logging macros.
//!
//! Every ledger log line carries a `component` field so JSON output can be
//! filtered per crate.

/// Log with a component field.
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a crediting decision with the standard fields.
#[macro_export]
macro_rules! log_credit_event {
    ($level:ident, $component:expr, $msg:expr, $address:expr, $task:expr, $points:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            address = %$address,
            task = %$task,
            points = $points,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a transaction-scoped event with the standard fields.
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $component:expr, $msg:expr, $tx_hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            tx_hash = %$tx_hash,
            $($($field)*,)?
            $msg
        )
    };
}
