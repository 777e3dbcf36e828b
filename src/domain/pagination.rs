use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(number: Option<u32>, size: Option<u32>, limits: PageLimits) -> Self {
        let max_size = limits.max_size.max(1);
        Self {
            number: number.unwrap_or(0),
            size: size.unwrap_or(limits.default_size).clamp(1, max_size),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number) * u64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub metadata: PageMetadata,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            metadata: PageMetadata {
                number: request.number,
                size: request.size,
                total_elements,
                total_pages: total_elements.div_ceil(u64::from(request.size)),
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            metadata: self.metadata,
        }
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.metadata.number) + 1 < self.metadata.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.metadata.number > 0
    }

    pub fn last_number(&self) -> u64 {
        self.metadata.total_pages.saturating_sub(1)
    }
}
