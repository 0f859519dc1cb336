//! Platform-specific thread tuning for the interception thread.

/// Raise the calling thread to the highest normal priority.
///
/// Physical input stalls while the loop is descheduled, so the interception
/// thread asks for more CPU time. Returns whether the priority was changed.
#[cfg(target_os = "windows")]
pub(crate) fn raise_current_thread_priority() -> bool {
    use windows::Win32::System::Threading::{
        GetCurrentThread, SetThreadPriority, THREAD_PRIORITY_HIGHEST,
    };

    // SAFETY: the pseudo handle for the current thread needs no cleanup.
    match unsafe { SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_HIGHEST) } {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to raise interception thread priority: {}", e);
            false
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub(crate) fn raise_current_thread_priority() -> bool {
    log::debug!("thread priority left unchanged on this platform");
    false
}
