/// Info-level log with call-site context, matching the teacher's `full_info!`.
#[macro_export]
macro_rules! full_info {
    ($($arg:tt)*) => {{
        log::info!("[{}:{}] {}", file!(), line!(), format!($($arg)*));
    }};
}

/// Logs an error value and returns it from the enclosing function.
#[macro_export]
macro_rules! log_return_err {
    ( $e:expr ) => {{
        log::error!("\t{}\n {:#?}", $e, $e);
        return Err($e);
    }};
}
