mod formatters;
mod menu_builder;

use crate::tint::{tint_rgba, IconTint};
use crate::types::NotificationsSnapshot;
use tauri::tray::{TrayIcon, TrayIconBuilder};
use tauri::{image::Image, AppHandle, Runtime};

pub(crate) use menu_builder::debug_menu_enabled;

#[cfg(target_os = "macos")]
use objc2::MainThreadMarker;
#[cfg(target_os = "macos")]
use objc2_app_kit::{NSColor, NSForegroundColorAttributeName};
#[cfg(target_os = "macos")]
use objc2_foundation::{NSAttributedString, NSDictionary, NSString};

pub const TRAY_ID: &str = "main";

pub const ITEM_OPEN_NOTIFICATIONS: &str = "open_notifications";
pub const ITEM_CHECK_NOW: &str = "check_now";
pub const ITEM_OPEN_PREFERENCES: &str = "open_preferences";
pub const ITEM_CHECK_UPDATES: &str = "check_updates";
pub const ITEM_QUIT: &str = "quit";
pub const ITEM_THREAD_PREFIX: &str = "thread:";

pub const ITEM_DEBUG_SIMULATE_SOME: &str = "debug_simulate_some";
pub const ITEM_DEBUG_SIMULATE_NONE: &str = "debug_simulate_none";
pub const ITEM_DEBUG_CLEAR_SIMULATION: &str = "debug_clear_simulation";

const ICON_IDLE: &[u8] = include_bytes!("../../icons/tray-idle.png");
const ICON_HIGHLIGHT: &[u8] = include_bytes!("../../icons/tray-highlight.png");

// Dim grey used for a zero count.
#[cfg(target_os = "macos")]
const IDLE_TITLE_RGBA: (f64, f64, f64, f64) = (106.0 / 255.0, 106.0 / 255.0, 106.0 / 255.0, 0.3);

pub struct TrayUi<R: Runtime> {
    tray: TrayIcon<R>,
}

impl<R: Runtime> Clone for TrayUi<R> {
    fn clone(&self) -> Self {
        Self {
            tray: self.tray.clone(),
        }
    }
}

fn tinted_icon(tint: IconTint) -> tauri::Result<Image<'static>> {
    let base = Image::from_bytes(ICON_HIGHLIGHT)?;
    let mut rgba = base.rgba().to_vec();
    tint_rgba(&mut rgba, tint);
    Ok(Image::new_owned(rgba, base.width(), base.height()))
}

/// Set colored attributed title on macOS tray button.
#[cfg(target_os = "macos")]
fn set_colored_tray_title<R: Runtime>(
    tray: &TrayIcon<R>,
    title: &str,
    (red, green, blue, alpha): (f64, f64, f64, f64),
) {
    use objc2::rc::Retained;
    use objc2::runtime::{AnyObject, ProtocolObject};
    use objc2_foundation::NSCopying;

    let title_owned = title.to_string();

    let _ = tray.with_inner_tray_icon(move |inner| {
        let Some(ns_status_item) = inner.ns_status_item() else {
            return;
        };

        // Safety: tray callbacks run on the main thread.
        let mtm = unsafe { MainThreadMarker::new_unchecked() };

        let Some(button) = ns_status_item.button(mtm) else {
            return;
        };

        let color: Retained<NSColor> =
            NSColor::colorWithSRGBRed_green_blue_alpha(red, green, blue, alpha);

        let ns_string = NSString::from_str(&title_owned);
        let key = unsafe { NSForegroundColorAttributeName };

        let color_ref: &NSColor = &color;
        let key_ref: &NSString = &key;
        // Safety: NSColor is an Objective-C object and only lives inside this closure.
        let color_obj: &AnyObject =
            unsafe { std::mem::transmute::<&NSColor, &AnyObject>(color_ref) };
        // Safety: NSString conforms to NSCopying, as NSDictionary keys must.
        let key_copy: &ProtocolObject<dyn NSCopying> =
            unsafe { std::mem::transmute::<&NSString, &ProtocolObject<dyn NSCopying>>(key_ref) };
        let attrs: Retained<NSDictionary<NSString, AnyObject>> = unsafe {
            // Safety: keys are NSString and values AnyObject; the dictionary is consumed immediately.
            std::mem::transmute(
                NSDictionary::<AnyObject, AnyObject>::dictionaryWithObject_forKey(
                    color_obj, key_copy,
                ),
            )
        };
        let attributed_string = unsafe {
            NSAttributedString::initWithString_attributes(mtm.alloc(), &ns_string, Some(&attrs))
        };

        button.setAttributedTitle(&attributed_string);
    });
}

impl<R: Runtime> TrayUi<R> {
    pub fn new(app: &AppHandle<R>) -> tauri::Result<Self> {
        let menu = menu_builder::build_menu(app, formatters::TrayView::new(None, None))?;

        let tray = TrayIconBuilder::with_id(TRAY_ID)
            .icon(Image::from_bytes(ICON_IDLE)?)
            .icon_as_template(true)
            .menu(&menu)
            .tooltip("OctoBlast")
            .build(app)?;

        Ok(Self { tray })
    }

    /// Redraws menu, icon and title. A failed refresh keeps the count of `last_ok`.
    pub fn update_snapshot(
        &self,
        snapshot: Option<&NotificationsSnapshot>,
        last_ok: Option<&NotificationsSnapshot>,
        tint: IconTint,
        show_count: bool,
    ) {
        let view = formatters::TrayView::new(snapshot, last_ok);
        let app = self.tray.app_handle();
        match menu_builder::build_menu(app, view) {
            Ok(menu) => {
                let _ = self.tray.set_menu(Some(menu));
            }
            Err(e) => log::warn!("failed to rebuild tray menu: {e}"),
        }

        let count = view.count();
        self.set_icon(count, tint);

        let title = formatters::format_tray_title(view, show_count);

        #[cfg(target_os = "macos")]
        {
            match title {
                Some(title) => {
                    let color = if count == 0 {
                        IDLE_TITLE_RGBA
                    } else {
                        tint.components()
                    };
                    set_colored_tray_title(&self.tray, &title, color);
                }
                None => {
                    let _ = self.tray.set_title(None::<&str>);
                }
            }
        }

        #[cfg(not(target_os = "macos"))]
        {
            let _ = self.tray.set_title(title);
        }
    }

    fn set_icon(&self, count: usize, tint: IconTint) {
        let (icon, template) = if count == 0 {
            (Image::from_bytes(ICON_IDLE), true)
        } else {
            (tinted_icon(tint), false)
        };

        match icon {
            Ok(icon) => {
                let _ = self.tray.set_icon(Some(icon));
                let _ = self.tray.set_icon_as_template(template);
            }
            Err(e) => log::warn!("failed to load tray icon: {e}"),
        }
    }
}
