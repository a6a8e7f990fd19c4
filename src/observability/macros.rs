//! Call-site macros.
//!
//! `#[track_caller]` on the logger methods gives file and line but no
//! function name. These macros capture all three where they are expanded.

/// Build a [`Caller`](crate::observability::Caller) for the current
/// location, including the enclosing function name.
#[macro_export]
macro_rules! caller {
    () => {{
        fn __here() {}
        fn __name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __name_of(__here);
        $crate::observability::Caller::new(
            file!(),
            line!(),
            name.strip_suffix("::__here").unwrap_or(name),
        )
    }};
}

/// Build a [`Fields`](crate::observability::Fields) map from
/// `key => value` pairs. Values may be anything serializable.
#[macro_export]
macro_rules! fields {
    () => {
        $crate::observability::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::observability::Fields::new();
        $(
            fields.insert(
                ::std::string::String::from($key),
                $crate::observability::__private::json!($value),
            );
        )+
        fields
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $message:expr $(,)?) => {
        $logger.log_at($crate::observability::Severity::Debug, $message, None, $crate::caller!())
    };
    ($logger:expr, $message:expr, $fields:expr $(,)?) => {
        $logger.log_at($crate::observability::Severity::Debug, $message, Some($fields), $crate::caller!())
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $message:expr $(,)?) => {
        $logger.log_at($crate::observability::Severity::Info, $message, None, $crate::caller!())
    };
    ($logger:expr, $message:expr, $fields:expr $(,)?) => {
        $logger.log_at($crate::observability::Severity::Info, $message, Some($fields), $crate::caller!())
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $message:expr $(,)?) => {
        $logger.log_at($crate::observability::Severity::Warn, $message, None, $crate::caller!())
    };
    ($logger:expr, $message:expr, $fields:expr $(,)?) => {
        $logger.log_at($crate::observability::Severity::Warn, $message, Some($fields), $crate::caller!())
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $message:expr $(,)?) => {
        $logger.log_at($crate::observability::Severity::Error, $message, None, $crate::caller!())
    };
    ($logger:expr, $message:expr, $fields:expr $(,)?) => {
        $logger.log_at($crate::observability::Severity::Error, $message, Some($fields), $crate::caller!())
    };
}

/// Write a FATAL record and exit the process.
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $message:expr $(,)?) => {
        $logger.fatal_at($message, None, $crate::caller!())
    };
    ($logger:expr, $message:expr, $fields:expr $(,)?) => {
        $logger.fatal_at($message, Some($fields), $crate::caller!())
    };
}

#[cfg(test)]
mod tests {
    use crate::observability::{LoggerConfig, SharedBuffer};

    #[test]
    fn test_caller_names_enclosing_function() {
        let caller = crate::caller!();
        assert_eq!(caller.file, "macros.rs");
        assert_eq!(caller.function, "test_caller_names_enclosing_function");
    }

    #[test]
    fn test_fields_macro() {
        let status: u16 = 404;
        let fields = crate::fields! {
            "status_code" => status,
            "method" => "GET",
            "ok" => false,
        };
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["status_code"], 404);
        assert_eq!(fields["method"], "GET");
        assert!(crate::fields!().is_empty());
    }

    #[test]
    fn test_log_macro_renders_function() {
        let buffer = SharedBuffer::new();
        let logger = LoggerConfig::builder()
            .sink(buffer.sink())
            .colorize(false)
            .into_logger();

        crate::log_warn!(logger, "slow request", crate::fields! { "duration_ms" => 1200 });

        let out = buffer.contents();
        assert!(out.contains(" WARN (macros.rs:"));
        assert!(out.contains(" test_log_macro_renders_function) slow request duration_ms=1200"));
    }
}
