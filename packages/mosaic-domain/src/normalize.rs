use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Case- and accent-insensitive form of a display name, e.g. `"Patrimônio  Imaterial"` becomes
/// `"patrimonio imaterial"`.
pub fn normalize_name(input: &str) -> String {
	let stripped: String = input.nfd().filter(|ch| !is_combining_mark(*ch)).collect();

	stripped.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}

/// Truncates `input` to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
	match input.char_indices().nth(max_chars) {
		Some((byte_index, _)) => &input[..byte_index],
		None => input,
	}
}
