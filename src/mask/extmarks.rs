//! Building the full overlay list for a parsed buffer

use super::distribute::compute_line_masks;
use super::policy::MaskEngine;
use crate::cache::{MaskKey, TtlLruCache};
use crate::model::{ExtmarkSpec, LineMask, ParsedVariables};

/// Overlays for every maskable variable, ordered by position.
///
/// Per-variable line masks are looked up in (and stored to) `masks`.
pub fn build_extmarks(
    variables: &ParsedVariables,
    engine: &MaskEngine,
    source: Option<&str>,
    masks: &mut TtlLruCache<MaskKey, Vec<LineMask>>,
) -> Vec<ExtmarkSpec> {
    let config = engine.config();
    let mut extmarks = Vec::new();

    for variable in variables {
        if variable.is_comment && config.skip_comments {
            continue;
        }
        let key = MaskKey::for_variable(variable, source, config.mask_length, engine.fingerprint());
        let line_masks = match masks.get(&key) {
            Some(cached) => cached,
            None => masks.put(key, compute_line_masks(variable, engine, source)),
        };
        extmarks.extend(
            line_masks
                .iter()
                .map(|mask| ExtmarkSpec::from_line_mask(mask, &config.highlight_group)),
        );
    }

    extmarks.sort_by_key(|e| (e.line, e.col));
    extmarks
}
