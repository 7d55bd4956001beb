//! 丢旧有界队列（Drop-Oldest Bounded Queue）
//!
//! 固定容量的 FIFO 队列，满时先淘汰最旧的元素再追加新元素：
//! - 从不丢新元素，从不阻塞生产方
//! - 长度始终不超过容量
//! - 底层是预分配的环形缓冲区（`VecDeque::with_capacity`），稳态下 push 不分配内存
//!
//! 本类型本身不做同步，由 [`LossyPipeline`](crate::LossyPipeline) 在锁内使用。

use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// 丢旧有界队列
///
/// # 示例
///
/// ```rust
/// use legged_stream::DropOldestQueue;
/// use std::num::NonZeroUsize;
///
/// let mut queue = DropOldestQueue::new(NonZeroUsize::new(2).unwrap());
/// assert_eq!(queue.push('A'), None);
/// assert_eq!(queue.push('B'), None);
/// assert_eq!(queue.push('C'), Some('A')); // 满：淘汰最旧的 A
///
/// assert_eq!(queue.pop(), Some('B'));
/// assert_eq!(queue.pop(), Some('C'));
/// assert_eq!(queue.pop(), None);
/// ```
#[derive(Debug, Clone)]
pub struct DropOldestQueue<T> {
    items: VecDeque<T>,
    capacity: NonZeroUsize,
}

impl<T> DropOldestQueue<T> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// 追加元素，返回被淘汰的最旧元素（如有）
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity.get() {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// 取出最旧的元素
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity.get()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// 丢弃所有元素
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// 从旧到新遍历
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn queue<T>(capacity: usize) -> DropOldestQueue<T> {
        DropOldestQueue::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_capacity_two_scenario() {
        let mut q = queue(2);
        q.push("A");
        q.push("B");
        q.push("C");

        assert_eq!(q.iter().copied().collect::<Vec<_>>(), vec!["B", "C"]);
        assert_eq!(q.pop(), Some("B"));
        assert_eq!(q.pop(), Some("C"));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_capacity_one_keeps_newest() {
        let mut q = queue(1);
        assert_eq!(q.push(1), None);
        assert_eq!(q.push(2), Some(1));
        assert_eq!(q.push(3), Some(2));
        assert_eq!(q.len(), 1);
        assert!(q.is_full());
        assert_eq!(q.pop(), Some(3));
        assert!(q.is_empty());
    }

    #[test]
    fn test_interleaved_push_pop() {
        let mut q = queue(3);
        q.push(1);
        q.push(2);
        assert_eq!(q.pop(), Some(1));
        q.push(3);
        q.push(4);
        assert_eq!(q.push(5), Some(2));
        assert_eq!(q.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn test_no_reallocation_in_steady_state() {
        let mut q = queue(4);
        let allocated = q.items.capacity();
        for i in 0..1000 {
            q.push(i);
        }
        assert_eq!(q.items.capacity(), allocated);
        assert_eq!(q.capacity(), 4);
    }

    #[test]
    fn test_clear() {
        let mut q = queue(2);
        q.push(1);
        q.push(2);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.pop(), None);
    }

    proptest! {
        /// 推入 N+k 个元素（中间不取出）后，队列恰好保留最后 N 个，按推入顺序排列
        #[test]
        fn prop_keeps_last_n_in_order(capacity in 1usize..16, extra in 1usize..64) {
            let mut q = queue(capacity);
            let total = capacity + extra;
            let mut dropped = 0;
            for i in 0..total {
                if q.push(i).is_some() {
                    dropped += 1;
                }
                prop_assert!(q.len() <= capacity);
            }

            prop_assert_eq!(dropped, extra);
            let drained: Vec<usize> = std::iter::from_fn(|| q.pop()).collect();
            let expected: Vec<usize> = (extra..total).collect();
            prop_assert_eq!(drained, expected);
        }

        /// 任意 push/pop 序列下，长度不超过容量，取出顺序与推入顺序一致（去掉被淘汰的）
        #[test]
        fn prop_pop_order_matches_push_order(
            capacity in 1usize..8,
            ops in proptest::collection::vec(any::<bool>(), 0..200),
        ) {
            let mut q = queue(capacity);
            let mut next = 0u32;
            let mut last_popped: Option<u32> = None;
            for push in ops {
                if push {
                    q.push(next);
                    next += 1;
                } else if let Some(v) = q.pop() {
                    if let Some(prev) = last_popped {
                        prop_assert!(v > prev);
                    }
                    last_popped = Some(v);
                }
                prop_assert!(q.len() <= capacity);
            }
        }
    }
}
