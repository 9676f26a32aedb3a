//! System tray icon with the pet's context menu.
//! Uses Win32 Shell_NotifyIconW directly.

#[cfg(windows)]
use std::sync::atomic::{AtomicU8, Ordering};

#[cfg(windows)]
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
#[cfg(windows)]
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW,
};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
    GetCursorPos, LoadIconW, PostMessageW, RegisterClassW, SetForegroundWindow, TrackPopupMenu,
    CS_HREDRAW, CS_VREDRAW, HMENU, IDI_APPLICATION, MF_CHECKED, MF_SEPARATOR,
    MF_STRING, TPM_BOTTOMALIGN, TPM_LEFTALIGN, WM_COMMAND, WM_DESTROY, WM_USER, WNDCLASSW,
    WS_EX_TOOLWINDOW,
};

use crate::config::PetKind;

/// Custom message ID for tray icon callbacks.
#[cfg(windows)]
const WM_TRAYICON: u32 = WM_USER + 1;

/// Menu item IDs.
const ID_TOGGLE_VISIBLE: u16 = 1000;
const ID_REMOTE: u16 = 1001;
const ID_CHAT: u16 = 1002;
const ID_ADD_FOOD: u16 = 1003;
const ID_CLEAR_FOOD: u16 = 1004;
const ID_ADD_WASTE: u16 = 1005;
const ID_CLEAN_WASTE: u16 = 1006;
const ID_REVIVE: u16 = 1007;
const ID_CAT: u16 = 1008;
const ID_DOG: u16 = 1009;
const ID_QUIET: u16 = 1010;
const ID_SETTINGS: u16 = 1011;
const ID_NOTES: u16 = 1012;
const ID_QUIT: u16 = 1013;

/// Commands returned from tray menu interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    None,
    ToggleVisible,
    Remote,
    Chat,
    AddFood,
    ClearFood,
    AddWaste,
    CleanWaste,
    Revive,
    SetKind(PetKind),
    ToggleQuiet,
    Settings,
    Notes,
    Quit,
}

impl TrayCommand {
    fn from_id(id: u16) -> Self {
        match id {
            ID_TOGGLE_VISIBLE => TrayCommand::ToggleVisible,
            ID_REMOTE => TrayCommand::Remote,
            ID_CHAT => TrayCommand::Chat,
            ID_ADD_FOOD => TrayCommand::AddFood,
            ID_CLEAR_FOOD => TrayCommand::ClearFood,
            ID_ADD_WASTE => TrayCommand::AddWaste,
            ID_CLEAN_WASTE => TrayCommand::CleanWaste,
            ID_REVIVE => TrayCommand::Revive,
            ID_CAT => TrayCommand::SetKind(PetKind::Cat),
            ID_DOG => TrayCommand::SetKind(PetKind::Dog),
            ID_QUIET => TrayCommand::ToggleQuiet,
            ID_SETTINGS => TrayCommand::Settings,
            ID_NOTES => TrayCommand::Notes,
            ID_QUIT => TrayCommand::Quit,
            _ => TrayCommand::None,
        }
    }
}

/// Checkmarks shown in the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuState {
    pub visible: bool,
    pub quiet: bool,
    pub dog: bool,
}

impl MenuState {
    fn bits(self) -> u8 {
        self.visible as u8 | (self.quiet as u8) << 1 | (self.dog as u8) << 2
    }

    #[cfg(windows)]
    fn from_bits(bits: u8) -> Self {
        Self {
            visible: bits & 1 != 0,
            quiet: bits & 2 != 0,
            dog: bits & 4 != 0,
        }
    }
}

/// Menu checkmarks, read from the window procedure when the menu opens.
#[cfg(windows)]
static MENU_STATE: AtomicU8 = AtomicU8::new(1);

/// System tray icon state.
pub struct TrayIcon {
    #[cfg(windows)]
    hwnd: HWND,
    #[cfg(windows)]
    nid: NOTIFYICONDATAW,
    /// Pending command from the last menu interaction.
    pub pending_command: TrayCommand,
}

#[cfg(windows)]
impl TrayIcon {
    pub fn new(tooltip: &str) -> Option<Self> {
        unsafe {
            // Register a hidden window class for receiving tray messages.
            let class_name: Vec<u16> = "DeskPetTrayClass\0".encode_utf16().collect();
            let wc = WNDCLASSW {
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(tray_wnd_proc),
                lpszClassName: windows::core::PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };
            RegisterClassW(&wc);

            use windows::Win32::Foundation::HINSTANCE;
            let hwnd = match CreateWindowExW(
                WS_EX_TOOLWINDOW,
                windows::core::PCWSTR(class_name.as_ptr()),
                windows::core::PCWSTR::null(),
                Default::default(),
                0,
                0,
                0,
                0,
                HWND::default(),
                HMENU::default(),
                HINSTANCE::default(),
                None,
            ) {
                Ok(hwnd) => hwnd,
                Err(e) => {
                    log::error!("Failed to create tray message window: {e}");
                    return None;
                }
            };

            let mut nid = NOTIFYICONDATAW::default();
            nid.cbSize = std::mem::size_of::<NOTIFYICONDATAW>() as u32;
            nid.hWnd = hwnd;
            nid.uID = 1;
            nid.uFlags = NIF_ICON | NIF_MESSAGE | NIF_TIP;
            nid.uCallbackMessage = WM_TRAYICON;
            nid.hIcon = LoadIconW(None, IDI_APPLICATION).unwrap_or_default();

            for (i, ch) in tooltip.encode_utf16().enumerate() {
                if i >= nid.szTip.len() - 1 {
                    break;
                }
                nid.szTip[i] = ch;
            }

            let _ = Shell_NotifyIconW(NIM_ADD, &nid);

            log::info!("System tray icon created");

            Some(Self {
                hwnd,
                nid,
                pending_command: TrayCommand::None,
            })
        }
    }

    /// Update the checkmarks for the next time the menu opens.
    pub fn set_state(&self, state: MenuState) {
        MENU_STATE.store(state.bits(), Ordering::Relaxed);
    }

    /// Poll for tray menu commands. Call once per frame.
    pub fn poll(&mut self) -> TrayCommand {
        unsafe {
            use windows::Win32::UI::WindowsAndMessaging::{
                DispatchMessageW, PeekMessageW, TranslateMessage, PM_REMOVE,
            };
            let mut msg = std::mem::zeroed();
            while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);

                if msg.message == WM_COMMAND {
                    let id = (msg.wParam.0 & 0xFFFF) as u16;
                    self.pending_command = TrayCommand::from_id(id);
                }
            }
        }

        std::mem::replace(&mut self.pending_command, TrayCommand::None)
    }

    /// Remove the tray icon (called on shutdown).
    pub fn remove(&mut self) {
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &self.nid);
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

#[cfg(windows)]
impl Drop for TrayIcon {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Window procedure for the hidden tray message window.
#[cfg(windows)]
unsafe extern "system" fn tray_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_TRAYICON {
        let event = (lparam.0 & 0xFFFF) as u32;
        // WM_RBUTTONUP = 0x0205, WM_LBUTTONUP = 0x0202
        if event == 0x0205 || event == 0x0202 {
            show_context_menu(hwnd);
            return LRESULT(0);
        }
    }
    if msg == WM_COMMAND {
        // Post back to self so poll() picks it up via PeekMessage
        let _ = PostMessageW(hwnd, WM_COMMAND, wparam, LPARAM(0));
        return LRESULT(0);
    }
    if msg == WM_DESTROY {
        return LRESULT(0);
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

/// Menu layout; `None` is a separator.
fn menu_items(state: MenuState) -> Vec<Option<(u16, &'static str, bool)>> {
    let show_label = if state.visible { "Hide" } else { "Show" };
    vec![
        Some((ID_TOGGLE_VISIBLE, show_label, false)),
        Some((ID_REMOTE, "Remote control", false)),
        Some((ID_CHAT, "Chat", false)),
        None,
        Some((ID_ADD_FOOD, "Add food", false)),
        Some((ID_CLEAR_FOOD, "Clear food", false)),
        Some((ID_ADD_WASTE, "Add waste", false)),
        Some((ID_CLEAN_WASTE, "Clean waste", false)),
        Some((ID_REVIVE, "Revive", false)),
        None,
        Some((ID_CAT, "Cat", !state.dog)),
        Some((ID_DOG, "Dog", state.dog)),
        Some((ID_QUIET, "Quiet mode", state.quiet)),
        None,
        Some((ID_NOTES, "My notes", false)),
        Some((ID_SETTINGS, "Settings", false)),
        None,
        Some((ID_QUIT, "Quit", false)),
    ]
}

/// Show the context menu at the cursor position.
#[cfg(windows)]
unsafe fn show_context_menu(hwnd: HWND) {
    let hmenu = match CreatePopupMenu() {
        Ok(menu) => menu,
        Err(e) => {
            log::warn!("Failed to create tray menu: {e}");
            return;
        }
    };

    let state = MenuState::from_bits(MENU_STATE.load(Ordering::Relaxed));
    for item in menu_items(state) {
        match item {
            Some((id, label, checked)) => {
                let wide: Vec<u16> = label.encode_utf16().chain(std::iter::once(0)).collect();
                let flags = if checked { MF_STRING | MF_CHECKED } else { MF_STRING };
                let _ = AppendMenuW(
                    hmenu,
                    flags,
                    id as usize,
                    windows::core::PCWSTR(wide.as_ptr()),
                );
            }
            None => {
                let _ = AppendMenuW(
                    hmenu,
                    MF_SEPARATOR,
                    0,
                    windows::core::PCWSTR::null(),
                );
            }
        }
    }

    let mut pt = windows::Win32::Foundation::POINT::default();
    let _ = GetCursorPos(&mut pt);

    // Required so menu closes when clicking outside
    let _ = SetForegroundWindow(hwnd);

    let _ = TrackPopupMenu(
        hmenu,
        TPM_LEFTALIGN | TPM_BOTTOMALIGN,
        pt.x,
        pt.y,
        0,
        hwnd,
        None,
    );

    let _ = DestroyMenu(hmenu);
}

// Non-windows stub
#[cfg(not(windows))]
impl TrayIcon {
    pub fn new(_tooltip: &str) -> Option<Self> {
        log::info!("No system tray on this platform");
        None
    }
    pub fn set_state(&self, state: MenuState) {
        let _ = state.bits();
    }
    pub fn poll(&mut self) -> TrayCommand {
        std::mem::replace(&mut self.pending_command, TrayCommand::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_menu_item_maps_to_a_command() {
        for (id, label, _) in menu_items(MenuState::default()).into_iter().flatten() {
            assert_ne!(TrayCommand::from_id(id), TrayCommand::None, "{label}");
        }
        assert_eq!(TrayCommand::from_id(1), TrayCommand::None);
    }

    #[test]
    fn menu_reflects_state() {
        let state = MenuState {
            visible: false,
            quiet: true,
            dog: true,
        };
        let items: Vec<_> = menu_items(state).into_iter().flatten().collect();
        assert_eq!(items[0].1, "Show");
        assert!(items.iter().any(|&(id, _, checked)| id == ID_DOG && checked));
        assert!(items.iter().any(|&(id, _, checked)| id == ID_QUIET && checked));
        assert!(items.iter().any(|&(id, _, checked)| id == ID_CAT && !checked));
    }
}
