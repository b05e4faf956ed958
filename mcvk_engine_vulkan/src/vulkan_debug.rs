/// Vulkan Debug Messenger - forwards validation layer messages to the engine logger
///
/// Messages are counted per severity and grouped by text so repeated
/// messages show their occurrence count. Counting only happens between
/// [`init_debug_messages`] and [`cleanup_debug_messages`].

use ash::vk;
use colored::*;
use mcvk_engine::mcvk::Engine;
use mcvk_engine::mcvk::log::LogSeverity;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

const SOURCE: &str = "mcvk::vulkan::validation";

/// Per-severity validation message counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// Thread-safe validation statistics tracker
struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn record(&self, severity: LogSeverity) {
        let counter = match severity {
            LogSeverity::Error | LogSeverity::Fatal => &self.errors,
            LogSeverity::Warn => &self.warnings,
            LogSeverity::Info => &self.info,
            LogSeverity::Diagnostic => &self.verbose,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Messages are dropped outside the messenger's lifetime
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Occurrences of each message text
static MESSAGE_COUNTS: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Reset counters and start accepting messages
pub(crate) fn init_debug_messages() {
    VALIDATION_STATS.reset();
    if let Ok(mut counts) = MESSAGE_COUNTS.lock() {
        *counts = Some(FxHashMap::default());
    }
    ACTIVE.store(true, Ordering::Release);
}

/// Stop accepting messages (called before the messenger is destroyed)
pub(crate) fn cleanup_debug_messages() {
    ACTIVE.store(false, Ordering::Release);
}

/// Current validation statistics
pub fn validation_stats() -> ValidationStats {
    VALIDATION_STATS.get()
}

/// Print validation statistics report
pub fn print_validation_stats_report() {
    let stats = validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());
    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }
    println!("  {} {}", "Total:".white().bold(), stats.total());

    let repeated = MESSAGE_COUNTS
        .lock()
        .ok()
        .and_then(|counts| counts.as_ref().map(|c| c.values().filter(|&&n| n > 1).count()))
        .unwrap_or(0);
    if repeated > 0 {
        println!("\n  {} message(s) appeared multiple times", repeated);
    }
    println!("{}\n", "====================================".bright_blue().bold());
}

/// Engine severity of a validation message
pub(crate) fn message_severity(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Info
    } else {
        LogSeverity::Diagnostic
    }
}

fn message_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Count and forward one message; returns its occurrence count
pub(crate) fn forward_message(
    severity: LogSeverity,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    message_id: &str,
    message: &str,
) -> u32 {
    if !ACTIVE.load(Ordering::Acquire) {
        return 0;
    }
    VALIDATION_STATS.record(severity);

    let occurrences = match MESSAGE_COUNTS.lock() {
        Ok(mut counts) => {
            let counts = counts.get_or_insert_with(FxHashMap::default);
            let count = counts.entry(message.to_string()).or_insert(0);
            *count += 1;
            *count
        }
        Err(_) => 1,
    };
    let repeat = if occurrences > 1 {
        format!(" [x{}]", occurrences)
    } else {
        String::new()
    };

    Engine::log(
        severity,
        SOURCE,
        format!("[{}] {}{}: {}", message_type_name(message_type), message_id, repeat, message),
    );
    occurrences
}

/// Vulkan debug messenger callback
///
/// Never asks the driver to abort the triggering call.
#[cfg(feature = "vulkan-validation")]
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity_flags: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = &*p_callback_data;
    let message_id = callback_data
        .message_id_name_as_c_str()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown".to_string());
    let message = callback_data
        .message_as_c_str()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "No message".to_string());

    forward_message(message_severity(message_severity_flags), message_type, &message_id, &message);
    vk::FALSE
}

#[cfg(test)]
#[path = "vulkan_debug_tests.rs"]
mod tests;
