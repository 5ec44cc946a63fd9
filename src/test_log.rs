//! Logging sink for unit tests running on host
//!
//! On target `defmt-rtt` provides the global logger, tests just discard the frames.

#[defmt::global_logger]
struct Discard;

unsafe impl defmt::Logger for Discard {
    fn acquire() {}

    unsafe fn flush() {}

    unsafe fn release() {}

    unsafe fn write(_bytes: &[u8]) {}
}

defmt::timestamp!("{=u8}", 0);
