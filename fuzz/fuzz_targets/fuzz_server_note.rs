#![no_main]

use libfuzzer_sys::fuzz_target;
use wordgame_session::codec::decode_server_note;
use wordgame_session::resolve_player;
use wordgame_session::ServerNote;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Decoding must reject bad input with an error, never a panic. Anything
    // that decodes must also resolve (or fail to resolve) cleanly.
    if let Ok(ServerNote::State(state)) = decode_server_note(text) {
        let _ = resolve_player(&state);
        let _ = state.room_state.tile(usize::MAX, 0);
    }
});
