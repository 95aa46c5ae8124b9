//! # 推进前沿（Frontier）
//!
//! 窄带像素的最小优先队列。基于 `BinaryHeap` 反转比较实现最小堆，
//! decrease-key 通过“重新入队更小的条目 + 出队时丢弃过期条目”实现。
//!
//! 距离相等时按行优先下标排序，保证同一输入的填充顺序完全可复现。

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    distance: f32,
    index: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap 是最大堆，这里反转得到最小堆
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// 按试探距离排序的窄带集合。
#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// 插入像素，或以更小的距离再次插入（decrease-key）。
    pub fn push(&mut self, index: usize, distance: f32) {
        self.heap.push(FrontierEntry { distance, index });
    }

    /// 取出距离最小且仍然有效的像素。
    ///
    /// `is_current(index, distance)` 用于判断条目是否仍是该像素的最新试探值，
    /// 返回 `false` 的条目会被直接丢弃。
    pub fn pop_min<F>(&mut self, mut is_current: F) -> Option<(usize, f32)>
    where
        F: FnMut(usize, f32) -> bool,
    {
        while let Some(entry) = self.heap.pop() {
            if is_current(entry.index, entry.distance) {
                return Some((entry.index, entry.distance));
            }
        }
        None
    }

    /// 当前条目数（含尚未清理的过期条目）。
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
