use mosaic_domain::normalize::{normalize_name, truncate_chars};

#[test]
fn normalizes_accents_case_and_spacing() {
	assert_eq!(normalize_name("Música"), "musica");
	assert_eq!(normalize_name("  Patrimônio   Imaterial "), "patrimonio imaterial");
	assert_eq!(normalize_name("ÁGUA"), normalize_name("agua"));
}

#[test]
fn normalization_is_idempotent() {
	let once = normalize_name("Conceição da Barra");

	assert_eq!(normalize_name(&once), once);
}

#[test]
fn truncation_respects_char_boundaries() {
	assert_eq!(truncate_chars("ação", 2), "aç");
	assert_eq!(truncate_chars("abc", 10), "abc");
	assert_eq!(truncate_chars("", 3), "");
}
