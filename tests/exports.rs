//! Exercises the exported C symbols against installed cores.

use std::ffi::{CStr, CString};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use rtss::{InMemoryCore, ProfileCore};

// The exported symbols share one process-wide core.
static CORE_LOCK: Mutex<()> = Mutex::new(());

fn with_core(core: Arc<dyn ProfileCore>) -> MutexGuard<'static, ()> {
    let guard = CORE_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    rtss::install_core(core);
    guard
}

#[derive(Debug, PartialEq)]
enum Call {
    SetProperty(Vec<u8>, Vec<u8>, i32),
    GetProperty(Vec<u8>, Vec<u8>),
    SetFlags(u32, u32),
    GetFlags,
    DeleteProfile(Vec<u8>),
    ResetProfile(Vec<u8>),
    CreateProfile(Vec<u8>),
}

#[derive(Default)]
struct RecordingCore {
    calls: Mutex<Vec<Call>>,
}

impl RecordingCore {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl ProfileCore for RecordingCore {
    fn set_property(&self, profile: &CStr, property: &CStr, value: i32) {
        self.record(Call::SetProperty(
            profile.to_bytes().to_vec(),
            property.to_bytes().to_vec(),
            value,
        ));
    }

    fn get_property(&self, profile: &CStr, property: &CStr) -> i32 {
        self.record(Call::GetProperty(
            profile.to_bytes().to_vec(),
            property.to_bytes().to_vec(),
        ));
        -7
    }

    fn set_flags(&self, and_mask: u32, or_mask: u32) -> u32 {
        self.record(Call::SetFlags(and_mask, or_mask));
        0
    }

    fn get_flags(&self) -> u32 {
        self.record(Call::GetFlags);
        0xDEAD_BEEF
    }

    fn delete_profile(&self, profile: &CStr) {
        self.record(Call::DeleteProfile(profile.to_bytes().to_vec()));
    }

    fn reset_profile(&self, profile: &CStr) {
        self.record(Call::ResetProfile(profile.to_bytes().to_vec()));
    }

    fn create_profile(&self, profile: &CStr) {
        self.record(Call::CreateProfile(profile.to_bytes().to_vec()));
    }
}

#[test]
fn property_round_trip() {
    let _guard = with_core(Arc::new(InMemoryCore::new()));
    unsafe {
        rtss::set_property(c"".as_ptr(), c"FramerateLimit".as_ptr(), 72);
        rtss::set_property(c"game.exe".as_ptr(), c"FramerateLimit".as_ptr(), i32::MIN);

        assert_eq!(
            rtss::get_property(c"".as_ptr(), c"FramerateLimit".as_ptr()),
            72
        );
        assert_eq!(
            rtss::get_property(c"game.exe".as_ptr(), c"FramerateLimit".as_ptr()),
            i32::MIN
        );
    }
}

#[test]
fn unset_property_reads_default() {
    let _guard = with_core(Arc::new(InMemoryCore::new()));
    let value = unsafe { rtss::get_property(c"never.exe".as_ptr(), c"Missing".as_ptr()) };
    assert_eq!(value, 0);
}

#[test]
fn set_flags_applies_and_then_or() {
    let _guard = with_core(Arc::new(InMemoryCore::with_flags(0b1111_0000)));
    let previous = rtss::get_flags();

    rtss::set_flags(0b0011_0000, 0b0000_0101);
    assert_eq!(rtss::get_flags(), (previous & 0b0011_0000) | 0b0000_0101);

    rtss::set_flags(!4, 0);
    assert_eq!(rtss::get_flags(), 0b0011_0001);
}

#[test]
fn set_flags_full_width_masks() {
    let _guard = with_core(Arc::new(InMemoryCore::with_flags(0x8000_0000)));

    rtss::set_flags(0xFFFF_FFFF, 0);
    assert_eq!(rtss::get_flags(), 0x8000_0000);

    rtss::set_flags(0, 0);
    assert_eq!(rtss::get_flags(), 0);

    rtss::set_flags(0, 0xFFFF_FFFF);
    assert_eq!(rtss::get_flags(), u32::MAX);
}

#[test]
fn concurrent_or_masks_converge() {
    let _guard = with_core(Arc::new(InMemoryCore::new()));

    let handles: Vec<_> = (0..32u32)
        .map(|bit| {
            thread::spawn(move || {
                for _ in 0..100 {
                    rtss::set_flags(u32::MAX, 1 << bit);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(rtss::get_flags(), u32::MAX);
}

#[test]
fn caller_buffers_can_be_freed_after_the_call() {
    let _guard = with_core(Arc::new(InMemoryCore::new()));

    let profile = CString::new("transient.exe").unwrap();
    let property = CString::new("FramerateLimit").unwrap();
    unsafe { rtss::set_property(profile.as_ptr(), property.as_ptr(), 144) };
    drop(profile);
    drop(property);

    // Clobber the freed region with unrelated allocations before reading back.
    let noise: Vec<CString> = (0..64)
        .map(|index| CString::new(format!("noise-{index:08}")).unwrap())
        .collect();

    let profile = CString::new("transient.exe").unwrap();
    let property = CString::new("FramerateLimit").unwrap();
    let value = unsafe { rtss::get_property(profile.as_ptr(), property.as_ptr()) };
    assert_eq!(value, 144);
    drop(noise);
}

#[test]
fn arguments_reach_the_core_unchanged() {
    let core = Arc::new(RecordingCore::default());
    let _guard = with_core(core.clone());

    let profile = CString::new(vec![0xFFu8, b'a', 0x80]).unwrap();
    let returned;
    let flags;
    unsafe {
        rtss::set_property(profile.as_ptr(), c"Prop".as_ptr(), -1);
        returned = rtss::get_property(profile.as_ptr(), c"Prop".as_ptr());
        rtss::set_flags(0x8000_0000, 0x7FFF_FFFF);
        flags = rtss::get_flags();
        rtss::delete_profile(c"gone".as_ptr());
        rtss::reset_profile(c"".as_ptr());
        rtss::create_profile(profile.as_ptr());
    }

    assert_eq!(returned, -7);
    assert_eq!(flags, 0xDEAD_BEEF);
    assert_eq!(
        core.take(),
        vec![
            Call::SetProperty(vec![0xFF, b'a', 0x80], b"Prop".to_vec(), -1),
            Call::GetProperty(vec![0xFF, b'a', 0x80], b"Prop".to_vec()),
            Call::SetFlags(0x8000_0000, 0x7FFF_FFFF),
            Call::GetFlags,
            Call::DeleteProfile(b"gone".to_vec()),
            Call::ResetProfile(Vec::new()),
            Call::CreateProfile(vec![0xFF, b'a', 0x80]),
        ]
    );
}

#[test]
fn delete_and_reset_profiles() {
    let core = Arc::new(InMemoryCore::new());
    let _guard = with_core(core.clone());

    unsafe {
        rtss::set_property(c"a.exe".as_ptr(), c"x".as_ptr(), 1);
        rtss::set_property(c"b.exe".as_ptr(), c"x".as_ptr(), 2);
        rtss::reset_profile(c"a.exe".as_ptr());
        rtss::delete_profile(c"b.exe".as_ptr());

        assert_eq!(rtss::get_property(c"a.exe".as_ptr(), c"x".as_ptr()), 0);
        assert_eq!(rtss::get_property(c"b.exe".as_ptr(), c"x".as_ptr()), 0);
    }
    assert_eq!(core.profile_names(), vec![c"a.exe".to_owned()]);
}

#[test]
fn create_profile_starts_from_global() {
    let core = Arc::new(InMemoryCore::new());
    let _guard = with_core(core.clone());

    let profile = CString::new("game.exe").unwrap();
    unsafe {
        rtss::set_property(c"".as_ptr(), c"FramerateLimit".as_ptr(), 60);
        rtss::set_property(c"".as_ptr(), c"OsdVisible".as_ptr(), 1);
        rtss::create_profile(profile.as_ptr());
    }
    drop(profile);

    unsafe {
        rtss::set_property(c"game.exe".as_ptr(), c"FramerateLimit".as_ptr(), 144);

        assert_eq!(
            rtss::get_property(c"game.exe".as_ptr(), c"FramerateLimit".as_ptr()),
            144
        );
        assert_eq!(
            rtss::get_property(c"game.exe".as_ptr(), c"OsdVisible".as_ptr()),
            1
        );
        assert_eq!(
            rtss::get_property(c"".as_ptr(), c"FramerateLimit".as_ptr()),
            60
        );
    }
    assert_eq!(
        core.profile_names(),
        vec![c"".to_owned(), c"game.exe".to_owned()]
    );
}

#[test]
fn install_core_returns_previous() {
    let _guard = with_core(Arc::new(InMemoryCore::with_flags(11)));
    let replacement: Arc<dyn ProfileCore> = Arc::new(InMemoryCore::with_flags(22));

    let previous = rtss::install_core(replacement.clone());
    assert_eq!(previous.get_flags(), 11);
    assert_eq!(rtss::get_flags(), 22);
    assert!(Arc::ptr_eq(&rtss::current_core(), &replacement));
}
