use super::formatters::{
    format_datetime_full, format_header, format_open_label, format_thread_label, TrayView,
};
use super::{
    ITEM_CHECK_NOW, ITEM_CHECK_UPDATES, ITEM_DEBUG_CLEAR_SIMULATION, ITEM_DEBUG_SIMULATE_NONE,
    ITEM_DEBUG_SIMULATE_SOME, ITEM_OPEN_NOTIFICATIONS, ITEM_OPEN_PREFERENCES, ITEM_QUIT,
    ITEM_THREAD_PREFIX,
};
use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::{AppHandle, Runtime};

const MAX_THREAD_ITEMS: usize = 10;

pub(crate) fn debug_menu_enabled() -> bool {
    matches!(
        std::env::var("OCTOBLAST_DEBUG").as_deref(),
        Ok("1") | Ok("true") | Ok("yes") | Ok("on")
    )
}

pub(super) fn build_menu<R: Runtime>(
    app: &AppHandle<R>,
    view: TrayView<'_>,
) -> tauri::Result<Menu<R>> {
    let header = MenuItem::with_id(app, "header", format_header(view), false, None::<&str>)?;
    let open = MenuItem::with_id(
        app,
        ITEM_OPEN_NOTIFICATIONS,
        format_open_label(view),
        true,
        Some("CmdOrCtrl+O"),
    )?;

    let mut details: Vec<MenuItem<R>> = Vec::new();
    let threads = view.threads();
    for thread in threads.iter().take(MAX_THREAD_ITEMS) {
        details.push(MenuItem::with_id(
            app,
            format!("{ITEM_THREAD_PREFIX}{}", thread.web_url),
            format_thread_label(thread),
            true,
            None::<&str>,
        )?);
    }
    if threads.len() > MAX_THREAD_ITEMS {
        details.push(MenuItem::with_id(
            app,
            "threads_more",
            format!("…and {} more", threads.len() - MAX_THREAD_ITEMS),
            false,
            None::<&str>,
        )?);
    }

    match view.latest {
        Some(snapshot) => {
            if let Some(message) = snapshot.error_message().filter(|m| !m.trim().is_empty()) {
                details.push(MenuItem::with_id(
                    app,
                    "error",
                    message,
                    false,
                    None::<&str>,
                )?);
            }
            details.push(MenuItem::with_id(
                app,
                "last_updated",
                format!(
                    "Last updated: {}",
                    format_datetime_full(snapshot.last_updated_at())
                ),
                false,
                None::<&str>,
            )?);
        }
        None => {
            details.push(MenuItem::with_id(
                app,
                "last_updated",
                "Last updated: --",
                false,
                None::<&str>,
            )?);
        }
    }

    let check = MenuItem::with_id(app, ITEM_CHECK_NOW, "Check", true, Some("CmdOrCtrl+R"))?;
    let preferences = MenuItem::with_id(
        app,
        ITEM_OPEN_PREFERENCES,
        "Preferences…",
        true,
        Some("CmdOrCtrl+,"),
    )?;
    let check_updates = MenuItem::with_id(
        app,
        ITEM_CHECK_UPDATES,
        "Check for Updates…",
        true,
        None::<&str>,
    )?;
    let quit = MenuItem::with_id(app, ITEM_QUIT, "Quit", true, Some("CmdOrCtrl+Q"))?;

    let sep_after_header = PredefinedMenuItem::separator(app)?;
    let sep_before_actions = PredefinedMenuItem::separator(app)?;
    let sep_before_quit = PredefinedMenuItem::separator(app)?;

    let mut refs: Vec<&dyn tauri::menu::IsMenuItem<R>> = vec![&header, &sep_after_header, &open];
    for item in &details {
        refs.push(item);
    }
    refs.push(&sep_before_actions);
    refs.push(&check);
    refs.push(&preferences);
    refs.push(&check_updates);

    let debug_items = if debug_menu_enabled() {
        vec![
            MenuItem::with_id(
                app,
                ITEM_DEBUG_SIMULATE_SOME,
                "Debug: Simulate 3 notifications",
                true,
                None::<&str>,
            )?,
            MenuItem::with_id(
                app,
                ITEM_DEBUG_SIMULATE_NONE,
                "Debug: Simulate no notifications",
                true,
                None::<&str>,
            )?,
            MenuItem::with_id(
                app,
                ITEM_DEBUG_CLEAR_SIMULATION,
                "Debug: Clear simulation",
                true,
                None::<&str>,
            )?,
        ]
    } else {
        vec![]
    };
    let sep_debug = PredefinedMenuItem::separator(app)?;
    if !debug_items.is_empty() {
        refs.push(&sep_debug);
        for item in &debug_items {
            refs.push(item);
        }
    }

    refs.push(&sep_before_quit);
    refs.push(&quit);

    Menu::with_items(app, refs.as_slice())
}
