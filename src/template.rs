use askama::Template;
use std::ops::RangeInclusive;

const PAGINATOR_LOOK_AHEAD: i32 = 2;

/// [1] 2 3 ... 13
/// 1 2 [3] 4 5 ... 13
/// 1 2 3 4 [5] 6 7 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 7 8 [9] 10 11 12 13
/// 1 ... 9 10 [11] 12 13
/// 1 ... 11 12 [13]
#[derive(Debug)]
pub struct Paginator {
    pub base_url: String,
    pub this_page: i32,
    pub page_count: i32,
}

#[derive(Template)]
#[template(path = "util/paginator.html")]
struct PaginatorTemplate<'a> {
    paginator: &'a Paginator,
}

pub trait PaginatorToHtml {
    fn as_html(&self) -> String;
    fn has_pages(&self) -> bool;
    fn get_page_url(&self, page: &i32) -> String;
    fn get_first_pages(&self) -> RangeInclusive<i32>;
    /// Empty unless both ends are cut off.
    fn get_inner_pages(&self) -> Vec<i32>;
    /// Empty if the first run already reaches the last page.
    fn get_last_pages(&self) -> Vec<i32>;
}

impl Paginator {
    /// Builds a paginator for `item_count` items. `this_page` is clamped into range.
    pub fn new(base_url: &str, this_page: i32, item_count: u64, per_page: u64) -> Self {
        let page_count = ((item_count + per_page.max(1) - 1) / per_page.max(1)).max(1) as i32;
        Self {
            base_url: base_url.to_owned(),
            this_page: this_page.clamp(1, page_count),
            page_count,
        }
    }

    fn window(&self) -> (i32, i32) {
        (
            (self.this_page - PAGINATOR_LOOK_AHEAD).max(1),
            (self.this_page + PAGINATOR_LOOK_AHEAD).min(self.page_count),
        )
    }

    /// The window reaches far enough back that page 1 joins it.
    fn joins_first(&self) -> bool {
        self.window().0 - 1 <= PAGINATOR_LOOK_AHEAD
    }

    /// The window reaches far enough forward that the last page joins it.
    fn joins_last(&self) -> bool {
        self.page_count - self.window().1 <= PAGINATOR_LOOK_AHEAD
    }
}

impl PaginatorToHtml for Paginator {
    fn has_pages(&self) -> bool {
        self.page_count > 1
    }

    fn get_page_url(&self, page: &i32) -> String {
        if *page <= 1 {
            self.base_url.to_owned()
        } else {
            format!("{}?page={}", self.base_url, page)
        }
    }

    fn get_first_pages(&self) -> RangeInclusive<i32> {
        if !self.joins_first() {
            1..=1
        } else if self.joins_last() {
            1..=self.page_count
        } else {
            1..=self.window().1
        }
    }

    fn get_inner_pages(&self) -> Vec<i32> {
        if self.joins_first() || self.joins_last() {
            Vec::new()
        } else {
            let (lo, hi) = self.window();
            (lo..=hi).collect()
        }
    }

    fn get_last_pages(&self) -> Vec<i32> {
        match (self.joins_first(), self.joins_last()) {
            (true, true) => Vec::new(),
            (false, true) => (self.window().0..=self.page_count).collect(),
            (_, false) => vec![self.page_count],
        }
    }

    fn as_html(&self) -> String {
        if self.has_pages() {
            let mut buffer = String::new();
            let template = PaginatorTemplate { paginator: self };
            if template.render_into(&mut buffer).is_err() {
                "[Paginator Util Error]".to_owned()
            } else {
                buffer
            }
        } else {
            "".to_owned()
        }
    }
}
