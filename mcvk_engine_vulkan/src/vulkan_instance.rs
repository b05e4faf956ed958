/// VulkanInstance - API entry point, presentation surface and validation messenger
///
/// Destroyed messenger first, then surface, then instance. Logical devices
/// created from it must be gone before it drops.

use ash::vk;
use std::ffi::CString;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use mcvk_engine::mcvk::{Config, Result};
use mcvk_engine::mcvk::backend::SurfaceHandle;
use mcvk_engine::{engine_diagnostic, engine_info, engine_init_err};

const SOURCE: &str = "mcvk::vulkan";

/// Layer enabled when validation is requested
pub const VALIDATION_LAYER: &std::ffi::CStr = c"VK_LAYER_KHRONOS_validation";

pub struct VulkanInstance {
    entry: ash::Entry,
    instance: ash::Instance,
    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Load the Vulkan library, create the instance and a surface for `window`
    ///
    /// Validation is enabled when `config.enable_validation` is set and the
    /// crate is built with the `vulkan-validation` feature. A requested but
    /// missing validation layer is an initialization failure.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| engine_init_err!(SOURCE, "Failed to load Vulkan library: {:?}", e))?;

            let validation = Self::validation_requested(config);
            if validation && !Self::has_validation_layer(&entry)? {
                return Err(engine_init_err!(SOURCE, "Validation layers requested, but not available"));
            }

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| engine_init_err!(SOURCE, "Invalid application name: {}", e))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"mcvk")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_0);

            let display_handle = window.display_handle()
                .map_err(|e| engine_init_err!(SOURCE, "Failed to get display handle: {}", e))?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| engine_init_err!(SOURCE, "Failed to get required extensions: {:?}", e))?
                .to_vec();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if validation {
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| engine_init_err!(SOURCE, "Failed to create Vulkan instance: {:?}", e))?;

            let debug_messenger = if validation {
                match Self::create_debug_messenger(&entry, &instance, config) {
                    Ok(messenger) => Some(messenger),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let surface = match window.window_handle() {
                Ok(window_handle) => ash_window::create_surface(
                    &entry,
                    &instance,
                    display_handle.as_raw(),
                    window_handle.as_raw(),
                    None,
                )
                .map_err(|e| engine_init_err!(SOURCE, "Failed to create surface: {:?}", e)),
                Err(e) => Err(engine_init_err!(SOURCE, "Failed to get window handle: {}", e)),
            };
            let surface = match surface {
                Ok(surface) => surface,
                Err(e) => {
                    Self::destroy_debug_messenger(debug_messenger);
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };

            engine_info!(SOURCE, "Vulkan instance created (validation: {})", validation);

            Ok(Self {
                entry,
                instance,
                surface_loader,
                surface,
                debug_messenger,
            })
        }
    }

    fn validation_requested(config: &Config) -> bool {
        #[cfg(feature = "vulkan-validation")]
        {
            config.enable_validation
        }
        #[cfg(not(feature = "vulkan-validation"))]
        {
            if config.enable_validation {
                engine_diagnostic!(SOURCE, "Validation requested but built without the vulkan-validation feature");
            }
            false
        }
    }

    /// Whether the Khronos validation layer is installed
    fn has_validation_layer(entry: &ash::Entry) -> Result<bool> {
        let layers = unsafe { entry.enumerate_instance_layer_properties() }
            .map_err(|e| engine_init_err!(SOURCE, "Failed to enumerate instance layers: {:?}", e))?;
        Ok(layers.iter().any(|layer| {
            layer.layer_name_as_c_str().map_or(false, |name| name == VALIDATION_LAYER)
        }))
    }

    #[cfg(feature = "vulkan-validation")]
    fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
        config: &Config,
    ) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
        crate::vulkan_debug::init_debug_messages();

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(crate::vulkan_format::debug_severity_to_vk(config.debug_severity))
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(crate::vulkan_debug::vulkan_debug_callback));

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&debug_info, None) }
            .map_err(|e| {
                crate::vulkan_debug::cleanup_debug_messages();
                engine_init_err!(SOURCE, "Failed to create debug messenger: {:?}", e)
            })?;

        engine_diagnostic!(SOURCE, "Debug messenger installed ({:?})", config.debug_severity);
        Ok((debug_utils, messenger))
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn create_debug_messenger(
        _entry: &ash::Entry,
        _instance: &ash::Instance,
        _config: &Config,
    ) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
        Err(engine_init_err!(SOURCE, "Built without the vulkan-validation feature"))
    }

    fn destroy_debug_messenger(
        messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    ) {
        if let Some((debug_utils, messenger)) = messenger {
            crate::vulkan_debug::cleanup_debug_messages();
            unsafe { debug_utils.destroy_debug_utils_messenger(messenger, None) };
        }
    }

    // ===== ACCESSORS =====

    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub(crate) fn surface_loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }

    /// The window surface, as an engine handle
    pub fn surface(&self) -> SurfaceHandle {
        use ash::vk::Handle;
        SurfaceHandle::from_raw(self.surface.as_raw())
    }

    pub fn validation_enabled(&self) -> bool {
        self.debug_messenger.is_some()
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        Self::destroy_debug_messenger(self.debug_messenger.take());
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
        engine_diagnostic!(SOURCE, "Vulkan instance destroyed");
    }
}
