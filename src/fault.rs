//! This file contains the fault handler that turns a decoder crash into a
//! reproducible report. It's installed for SIGABRT, SIGSEGV and SIGBUS and
//! runs on top of whatever state the faulting code left behind, so it only
//! does async-signal-safe things: read the memento, format into a stack
//! buffer, write(2), _exit(2).
//!
//! SPDX-License-Identifier: MIT

use crate::encoder::RECORDED_LEN;
use crate::err::FuzzErr;
use crate::memento::{RawRecord, MEMENTO};

/// Signals we report on
pub const FATAL_SIGNALS: [libc::c_int; 3] = [libc::SIGABRT, libc::SIGSEGV, libc::SIGBUS];

/// Big enough for the whole report with a long label
pub const REPORT_CAPACITY: usize = 256;

/// Labels longer than this get truncated in the report
const MAX_LABEL_LEN: usize = 64;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Fixed-capacity byte sink, silently drops whatever doesn't fit
struct ReportBuf<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> ReportBuf<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        ReportBuf { buf, len: 0 }
    }

    fn push(&mut self, byte: u8) {
        if self.len < self.buf.len() {
            self.buf[self.len] = byte;
            self.len += 1;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push(b);
        }
    }

    fn push_dec(&mut self, mut val: u32) {
        let mut digits = [0u8; 10];
        let mut n = 0;
        loop {
            digits[n] = b'0' + (val % 10) as u8;
            n += 1;
            val /= 10;
            if val == 0 {
                break;
            }
        }

        while n > 0 {
            n -= 1;
            self.push(digits[n]);
        }
    }

    fn push_hex(&mut self, byte: u8) {
        self.push(HEX_DIGITS[(byte >> 4) as usize]);
        self.push(HEX_DIGITS[(byte & 0xF) as usize]);
    }
}

/// Name of a fatal signal for the report
pub fn signal_name(signal: libc::c_int) -> &'static [u8] {
    match signal {
        libc::SIGABRT => b"SIGABRT",
        libc::SIGSEGV => b"SIGSEGV",
        libc::SIGBUS => b"SIGBUS",
        _ => b"n/a",
    }
}

/// Format the crash report for `record` into `out`, returns the length used.
/// No allocation, this runs inside the signal handler
pub fn format_report(signal: libc::c_int, record: &RawRecord<'_>, out: &mut [u8]) -> usize {
    let mut report = ReportBuf::new(out);

    report.push(b'\n');
    report.push_bytes(b"Machine mode: ");
    match record.label {
        Some(label) => {
            report.push_dec(record.config_id);
            report.push_bytes(b" (");
            report.push_bytes(&label[..label.len().min(MAX_LABEL_LEN)]);
            report.push_bytes(b")\n");
        }
        None => report.push_bytes(b"n/a (n/a)\n"),
    }

    report.push_bytes(b"Opcode at time of ");
    report.push_bytes(signal_name(signal));
    report.push_bytes(b":\n");
    for (i, &byte) in record.bytes.iter().enumerate() {
        report.push_hex(byte);
        report.push(if i + 1 == RECORDED_LEN { b'\n' } else { b' ' });
    }

    report.len
}

// Write everything to stdout, retrying partial writes and EINTR
fn write_all_raw(mut bytes: &[u8]) {
    while !bytes.is_empty() {
        let written = unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                bytes.as_ptr() as *const libc::c_void,
                bytes.len(),
            )
        };

        if written > 0 {
            bytes = &bytes[written as usize..];
        } else if written < 0
            && std::io::Error::last_os_error().raw_os_error() == Some(libc::EINTR)
        {
            continue;
        } else {
            return;
        }
    }
}

extern "C" fn crash_handler(signal: libc::c_int) {
    let mut out = [0u8; REPORT_CAPACITY];
    let len = format_report(signal, &MEMENTO.load(), &mut out);
    write_all_raw(&out[..len]);

    // The report bypassed std's buffered stdout, nothing left to flush
    unsafe {
        libc::_exit(libc::EXIT_FAILURE);
    }
}

/// Install `crash_handler` for every signal in `FATAL_SIGNALS`
pub fn install_crash_handler() -> Result<(), FuzzErr> {
    let mut sa: libc::sigaction = unsafe { std::mem::zeroed() };
    sa.sa_sigaction = crash_handler as extern "C" fn(libc::c_int) as libc::sighandler_t;
    sa.sa_flags = 0;
    unsafe {
        libc::sigemptyset(&mut sa.sa_mask);
    }

    for signal in FATAL_SIGNALS {
        let result = unsafe { libc::sigaction(signal, &sa, std::ptr::null_mut()) };
        if result != 0 {
            return Err(FuzzErr::from(&format!(
                "Unable to install handler for {}: {}",
                String::from_utf8_lossy(signal_name(signal)),
                std::io::Error::last_os_error()
            )));
        }
    }

    Ok(())
}
