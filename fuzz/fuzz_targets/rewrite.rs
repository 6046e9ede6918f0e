#![no_main]

use libfuzzer_sys::fuzz_target;
use toml_path_edit::{remove, set, Document, Path, TomlValue};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 100_000 {
        return;
    }

    // The first line is a dotted path, the rest is the document.
    let (dotted, text) = input.split_once('\n').unwrap_or((input, ""));

    // Parsing must be lossless, valid or not.
    let parsed = Document::parse(text);
    assert_eq!(parsed.tree().to_string(), text);

    let path: Path = dotted.parse().unwrap_or_default();
    if path.is_empty() || parsed.has_errors() {
        return;
    }

    // Edits may fail, but must not panic, and successful ones must parse.
    if let Ok(updated) = set(text, &path, &TomlValue::from("fuzz")) {
        assert!(!Document::parse(&updated).has_errors(), "{:?}", updated);
    }
    if let Ok(updated) = remove(text, &path) {
        assert!(!Document::parse(&updated).has_errors(), "{:?}", updated);
    }
});
