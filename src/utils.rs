/// Turns on UTF-8 output and ANSI escape handling so the report can repaint
/// itself. Terminals elsewhere already understand the escapes.
#[cfg(windows)]
pub fn enable_ansi_console() {
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetStdHandle, SetConsoleMode, SetConsoleOutputCP,
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_OUTPUT_HANDLE,
    };

    const UTF8_CODE_PAGE: u32 = 65001;

    unsafe {
        SetConsoleOutputCP(UTF8_CODE_PAGE);
        let stdout = GetStdHandle(STD_OUTPUT_HANDLE);
        let mut mode = 0;
        if GetConsoleMode(stdout, &mut mode) == 0 {
            return;
        }
        if mode & ENABLE_VIRTUAL_TERMINAL_PROCESSING == 0 {
            SetConsoleMode(stdout, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
        }
    }
}

#[cfg(not(windows))]
pub fn enable_ansi_console() {}
