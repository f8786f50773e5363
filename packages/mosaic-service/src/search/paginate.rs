use std::ops::Range;

/// Index range of `page` (1-based) in a sequence of `len` items. Out-of-range pages are empty.
pub fn page_bounds(len: usize, page: u32, per_page: u32) -> Range<usize> {
	let per_page = per_page as usize;
	let start = (page.saturating_sub(1) as usize).saturating_mul(per_page).min(len);
	let end = start.saturating_add(per_page).clamp(start, len);

	start..end
}

pub fn paginate<T>(mut items: Vec<T>, page: u32, per_page: u32) -> Vec<T> {
	let bounds = page_bounds(items.len(), page, per_page);

	items.truncate(bounds.end);
	items.drain(..bounds.start);

	items
}
