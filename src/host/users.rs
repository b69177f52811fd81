use std::ffi::CStr;
use std::mem::MaybeUninit;

const MAX_BUFFER: usize = 1 << 16;

/// Login name of `uid`, if the user database knows it.
pub fn user_name(uid: u32) -> Option<String> {
    let mut size = 1024;
    loop {
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut buf = vec![0 as libc::c_char; size];
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        // SAFETY: every pointer refers to storage owned by this frame, and
        // `buf.len()` is its real size.
        let rc = unsafe {
            libc::getpwuid_r(uid, pwd.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result)
        };
        if rc == libc::ERANGE && size < MAX_BUFFER {
            size *= 2;
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        // SAFETY: on success pw_name points into `buf`, which is still alive.
        let name = unsafe { CStr::from_ptr((*result).pw_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}

/// Name of group `gid`, if the group database knows it.
pub fn group_name(gid: u32) -> Option<String> {
    let mut size = 1024;
    loop {
        let mut grp = MaybeUninit::<libc::group>::uninit();
        let mut buf = vec![0 as libc::c_char; size];
        let mut result: *mut libc::group = std::ptr::null_mut();
        // SAFETY: as for getpwuid_r above.
        let rc = unsafe {
            libc::getgrgid_r(gid, grp.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result)
        };
        if rc == libc::ERANGE && size < MAX_BUFFER {
            size *= 2;
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        // SAFETY: on success gr_name points into `buf`.
        let name = unsafe { CStr::from_ptr((*result).gr_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_known() {
        // uid 0 is named in any sane passwd, but containers may lack one
        if let Some(name) = user_name(0) {
            assert!(!name.is_empty());
        }
    }

    #[test]
    fn test_unknown_uid() {
        assert_eq!(user_name(u32::MAX - 7), None);
    }
}
