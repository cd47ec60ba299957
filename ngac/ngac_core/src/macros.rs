//! Convenience macros for logging and node validation.

/// Log an event with the given level and key=value metadata.
///
/// # Examples
///
/// ```
/// use ngac_core::log_event;
/// use ngac_core::utils::LogLevel;
///
/// log_event!(LogLevel::Info, "policy loaded");
///
/// log_event!(LogLevel::Debug, "node created",
///     name => "oa1",
///     node_type => "OA",
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:expr, $message:expr) => {
        {
            use $crate::utils::LogLevel;
            match $level {
                LogLevel::Error => log::error!("[{}] {}", module_path!(), $message),
                LogLevel::Warning => log::warn!("[{}] {}", module_path!(), $message),
                LogLevel::Info => log::info!("[{}] {}", module_path!(), $message),
                LogLevel::Debug => log::debug!("[{}] {}", module_path!(), $message),
                LogLevel::Trace => log::trace!("[{}] {}", module_path!(), $message),
            }
        }
    };

    ($level:expr, $message:expr, $($key:ident => $value:expr),+ $(,)?) => {
        {
            use $crate::utils::LogLevel;
            let metadata = vec![$(format!("{}={}", stringify!($key), $value)),+].join(" ");
            match $level {
                LogLevel::Error => log::error!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Warning => log::warn!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Info => log::info!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Debug => log::debug!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Trace => log::trace!("[{}] {}: {}", module_path!(), $message, metadata),
            }
        }
    };
}

/// Return `GraphError::NodeNotFound` from the enclosing function unless every
/// named node exists in the graph.
///
/// # Examples
///
/// ```
/// use ngac_core::ensure_exists;
/// use ngac_core::traits::Graph;
///
/// fn rename(graph: &dyn Graph, name: &str) -> ngac_core::Result<()> {
///     ensure_exists!(graph, name);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure_exists {
    ($graph:expr, $($name:expr),+ $(,)?) => {
        $(
            if !$graph.exists($name)? {
                return Err($crate::error::GraphError::NodeNotFound($name.to_string()).into());
            }
        )+
    };
}
