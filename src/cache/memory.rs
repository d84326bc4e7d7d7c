//! Rough heap-size estimates for cached values

use crate::model::{ExtmarkSpec, LineMask, ParsedVariable, ParsedVariables};
use std::mem::size_of;

/// Estimated memory held by a value, including owned heap allocations
pub trait MemoryFootprint {
    fn estimated_size(&self) -> usize;
}

impl MemoryFootprint for String {
    fn estimated_size(&self) -> usize {
        size_of::<String>() + self.capacity()
    }
}

impl<T: MemoryFootprint> MemoryFootprint for Vec<T> {
    fn estimated_size(&self) -> usize {
        size_of::<Vec<T>>()
            + self.iter().map(|item| item.estimated_size()).sum::<usize>()
            + (self.capacity() - self.len()) * size_of::<T>()
    }
}

impl MemoryFootprint for ParsedVariable {
    fn estimated_size(&self) -> usize {
        size_of::<ParsedVariable>()
            + self.key.capacity()
            + self.value.capacity()
            + self.content_hash.as_str().len()
            + self
                .segments
                .iter()
                .map(|s| size_of_val(s) + s.suffix.capacity())
                .sum::<usize>()
    }
}

impl MemoryFootprint for ParsedVariables {
    fn estimated_size(&self) -> usize {
        // Map key (line, col, key string) plus tree node overhead per entry
        let per_entry = 3 * size_of::<usize>() + 16;
        size_of::<ParsedVariables>()
            + self
                .iter()
                .map(|v| v.estimated_size() + per_entry + v.key.len())
                .sum::<usize>()
    }
}

impl MemoryFootprint for ExtmarkSpec {
    fn estimated_size(&self) -> usize {
        size_of::<ExtmarkSpec>() + self.masked_text.capacity() + self.highlight_group.capacity()
    }
}

impl MemoryFootprint for LineMask {
    fn estimated_size(&self) -> usize {
        size_of::<LineMask>() + self.text.capacity()
    }
}

fn size_of_val<T>(_: &T) -> usize {
    size_of::<T>()
}
