use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 取出待上报的一批事件
///
/// 每个事件带有入队序号,失败放回时按序号归位。
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Batch<T> {
    seqs: Vec<u64>,
    items: Vec<T>,
}

impl<T> Batch<T> {
    pub(crate) fn items(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug)]
struct QueueState<T> {
    entries: VecDeque<(u64, T)>,
    next_seq: u64,
}

impl<T> QueueState<T> {
    fn drain(&mut self) -> Batch<T> {
        let (seqs, items) = self.entries.drain(..).unzip();
        Batch { seqs, items }
    }
}

/// 带触发阈值的FIFO队列
///
/// 阈值只决定何时触发上报,不限制容量: 离线期间队列可以无限增长。
/// 所有操作都在同一把锁内同步完成,持锁期间不会挂起。
#[derive(Debug)]
pub(crate) struct BatchQueue<T> {
    state: Mutex<QueueState<T>>,
    threshold: usize,
}

impl<T> BatchQueue<T> {
    pub(crate) fn new(threshold: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                next_seq: 0,
            }),
            threshold,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 追加事件
    ///
    /// 当 `drain_at_threshold` 为真且追加后长度达到阈值时,
    /// 在同一临界区内取走整个队列并返回,调用方负责上传。
    pub(crate) fn push(&self, item: T, drain_at_threshold: bool) -> Option<Batch<T>> {
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.push_back((seq, item));

        if drain_at_threshold && state.entries.len() >= self.threshold {
            Some(state.drain())
        } else {
            None
        }
    }

    /// 取走全部事件,队列为空时返回 `None`
    pub(crate) fn take_all(&self) -> Option<Batch<T>> {
        let mut state = self.lock();
        if state.entries.is_empty() {
            None
        } else {
            Some(state.drain())
        }
    }

    /// 失败批次放回队列
    ///
    /// 按入队序号归并: 批次排在期间新增的事件之前,
    /// 多个批次先后失败时也保持最初的入队顺序。
    pub(crate) fn restore(&self, batch: Batch<T>) {
        let mut state = self.lock();
        let current = std::mem::take(&mut state.entries);

        let mut restored = batch.seqs.into_iter().zip(batch.items).peekable();
        let mut current = current.into_iter().peekable();
        loop {
            let take_restored = match (restored.peek(), current.peek()) {
                (Some((a, _)), Some((b, _))) => a < b,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let entry = if take_restored {
                restored.next()
            } else {
                current.next()
            };
            state.entries.extend(entry);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

impl<T: Clone> BatchQueue<T> {
    /// 当前内容的拷贝
    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.lock()
            .entries
            .iter()
            .map(|(_, item)| item.clone())
            .collect()
    }
}
