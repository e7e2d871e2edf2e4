#![no_main]

use libfuzzer_sys::fuzz_target;
use dispatchscope::{session::TraceSession, trace::replay, DetectorConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut session) = TraceSession::new(DetectorConfig::default()) {
        let _ = replay(data, &mut session);
        let _ = session.finalize();
    }
});
