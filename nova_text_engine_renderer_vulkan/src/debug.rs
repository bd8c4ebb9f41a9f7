/// Vulkan Debug Messenger - Handles validation layer messages with colored output
///
/// This module provides a debug messenger callback for Vulkan validation layers.
/// Messages are filtered by the configured severity and printed with colored
/// severity tags so validation output stands apart from engine logs.

use ash::vk;
use colored::*;
use nova_text_engine::novatext::DebugSeverity;
use std::ffi::CStr;
use std::sync::Mutex;

/// Global debug configuration (shared across callbacks)
static DEBUG_CONFIG: Mutex<Option<Config>> = Mutex::new(None);

/// Debug configuration for the callback
#[derive(Clone)]
pub struct Config {
    pub severity: DebugSeverity,
}

/// Install the callback configuration. Called before the messenger is created.
pub fn init_debug_config(config: Config) {
    let mut guard = DEBUG_CONFIG.lock().unwrap();
    *guard = Some(config);
}

/// Clear the callback configuration so no messages fire during teardown.
pub fn cleanup_debug_config() {
    let mut guard = DEBUG_CONFIG.lock().unwrap();
    *guard = None;
}

/// Vulkan debug messenger callback
///
/// # Safety
///
/// Called by the Vulkan loader with valid pointers for the duration of the call.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    let config = {
        let guard = DEBUG_CONFIG.lock().unwrap();
        match guard.as_ref() {
            Some(cfg) => cfg.clone(),
            None => return vk::FALSE, // No config, ignore (teardown in progress)
        }
    };

    let should_display = match config.severity {
        DebugSeverity::ErrorsOnly => {
            message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR)
        }
        DebugSeverity::ErrorsAndWarnings => {
            message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR)
                || message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING)
        }
        DebugSeverity::All => true,
    };
    if !should_display {
        return vk::FALSE;
    }

    let severity_tag = if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        "VK ERROR".red().bold()
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        "VK WARN ".yellow()
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        "VK INFO ".green()
    } else {
        "VK VERB ".bright_black()
    };

    let type_tag = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "performance"
    } else {
        "general"
    };

    eprintln!(
        "[{}] [{}] [{}] {}",
        severity_tag,
        type_tag.bright_blue(),
        message_id_name,
        message
    );

    // Returning FALSE tells the driver not to abort the triggering call
    vk::FALSE
}
