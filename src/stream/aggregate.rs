//! Logical event grouping for record streams

use futures::{Stream, TryStream};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Instant, Sleep, sleep};

use crate::aggregator::{AggregationPolicy, EventAggregator, LogicalEvent};
use crate::record::Record;

/// Extension trait to group any record stream into logical events
pub trait AggregateExt: Stream {
    /// Group consecutive records into [`LogicalEvent`]s.
    ///
    /// A group is emitted when the next Event record arrives and when the
    /// underlying stream ends. With `idle_flush` set, a group is also emitted
    /// once no record has arrived for that long, so the last event of a quiet
    /// spool is not held back indefinitely.
    fn aggregate_events(
        self,
        policy: AggregationPolicy,
        idle_flush: Option<Duration>,
    ) -> AggregateEvents<Self>
    where
        Self: Sized,
        Self::Item: AsRef<Record>,
    {
        AggregateEvents::new(self, policy, idle_flush)
    }
}

impl<T: Stream> AggregateExt for T {}

/// Extension trait to group a fallible record stream into logical events
pub trait TryAggregateExt: TryStream {
    /// Like [`AggregateExt::aggregate_events`], for streams of `Result`s.
    ///
    /// Errors are passed through as soon as they arrive and do not close the
    /// group in progress.
    fn try_aggregate_events(
        self,
        policy: AggregationPolicy,
        idle_flush: Option<Duration>,
    ) -> TryAggregateEvents<Self>
    where
        Self: Sized,
        Self::Ok: AsRef<Record>,
    {
        TryAggregateEvents::new(self, policy, idle_flush)
    }
}

impl<T: TryStream> TryAggregateExt for T {}

/// Open group plus the idle timer that flushes it.
struct Grouping<T> {
    aggregator: EventAggregator<T>,
    idle_flush: Option<Duration>,
    idle: Option<Pin<Box<Sleep>>>,
}

impl<T: AsRef<Record>> Grouping<T> {
    fn new(policy: AggregationPolicy, idle_flush: Option<Duration>) -> Self {
        Self { aggregator: EventAggregator::with_policy(policy), idle_flush, idle: None }
    }

    fn push(&mut self, item: T) -> Option<LogicalEvent<T>> {
        let completed = self.aggregator.add(item);

        if let Some(duration) = self.idle_flush {
            let deadline = Instant::now() + duration;
            match self.idle.as_mut() {
                Some(timer) => timer.as_mut().reset(deadline),
                None => self.idle = Some(Box::pin(sleep(duration))),
            }
        }

        completed
    }

    fn finish(&mut self) -> Option<LogicalEvent<T>> {
        let rest = self.aggregator.flush();
        (!rest.is_empty()).then_some(rest)
    }

    /// Called once the inner stream is pending.
    fn poll_idle(&mut self, cx: &mut Context<'_>) -> Poll<LogicalEvent<T>> {
        if self.aggregator.is_empty() {
            return Poll::Pending;
        }
        if let Some(timer) = self.idle.as_mut() {
            if timer.as_mut().poll(cx).is_ready() {
                self.idle = None;
                return Poll::Ready(self.aggregator.flush());
            }
        }
        Poll::Pending
    }
}

pin_project! {
    /// A stream combinator that emits logical events
    pub struct AggregateEvents<S: Stream> {
        #[pin]
        stream: S,
        grouping: Grouping<S::Item>,
        done: bool,
    }
}

impl<S> AggregateEvents<S>
where
    S: Stream,
    S::Item: AsRef<Record>,
{
    pub fn new(stream: S, policy: AggregationPolicy, idle_flush: Option<Duration>) -> Self {
        Self { stream, grouping: Grouping::new(policy, idle_flush), done: false }
    }
}

impl<S> Stream for AggregateEvents<S>
where
    S: Stream,
    S::Item: AsRef<Record>,
{
    type Item = LogicalEvent<S::Item>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        loop {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => {
                    if let Some(event) = this.grouping.push(item) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(None) => {
                    *this.done = true;
                    return Poll::Ready(this.grouping.finish());
                }
                Poll::Pending => return this.grouping.poll_idle(cx).map(Some),
            }
        }
    }
}

pin_project! {
    /// A stream combinator that emits logical events and passes errors through
    pub struct TryAggregateEvents<S: TryStream> {
        #[pin]
        stream: S,
        grouping: Grouping<S::Ok>,
        done: bool,
    }
}

impl<S> TryAggregateEvents<S>
where
    S: TryStream,
    S::Ok: AsRef<Record>,
{
    pub fn new(stream: S, policy: AggregationPolicy, idle_flush: Option<Duration>) -> Self {
        Self { stream, grouping: Grouping::new(policy, idle_flush), done: false }
    }
}

impl<S> Stream for TryAggregateEvents<S>
where
    S: TryStream,
    S::Ok: AsRef<Record>,
{
    type Item = Result<LogicalEvent<S::Ok>, S::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        loop {
            match this.stream.as_mut().try_poll_next(cx) {
                Poll::Ready(Some(Ok(item))) => {
                    if let Some(event) = this.grouping.push(item) {
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    *this.done = true;
                    return Poll::Ready(this.grouping.finish().map(Ok));
                }
                Poll::Pending => return this.grouping.poll_idle(cx).map(|event| Some(Ok(event))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordType;
    use crate::test_utils::{
        FIXTURE_RECORD_COUNT, multi_record_event_records, sample_event, sample_packet,
    };
    use futures::StreamExt;

    #[tokio::test]
    async fn groups_are_emitted_on_next_event_and_at_end() {
        let mut records = multi_record_event_records();
        records.push(Record::Event(sample_event(RecordType::EventV2, 2)));
        records.push(Record::Packet(sample_packet(2, b"tail")));

        let groups: Vec<_> = futures::stream::iter(records)
            .aggregate_events(AggregationPolicy::Lenient, None)
            .collect()
            .await;

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), FIXTURE_RECORD_COUNT);
        assert_eq!(groups[1].len(), 2);
        assert_eq!(groups[1].event().map(|e| e.event_id), Some(2));
    }

    #[tokio::test]
    async fn empty_stream_yields_nothing() {
        let groups: Vec<LogicalEvent<Record>> = futures::stream::iter(Vec::<Record>::new())
            .aggregate_events(AggregationPolicy::Strict, None)
            .collect()
            .await;
        assert!(groups.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_flush_releases_the_last_event() {
        let records = multi_record_event_records();
        // Never ends, like a followed spool with no new data.
        let stream = futures::stream::iter(records).chain(futures::stream::pending());
        let mut events =
            Box::pin(stream.aggregate_events(AggregationPolicy::Lenient, Some(Duration::from_secs(1))));

        let started = Instant::now();
        let event = events.next().await.expect("idle flush should emit the buffered event");
        assert_eq!(event.len(), FIXTURE_RECORD_COUNT);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn errors_pass_through_without_splitting_the_group() {
        let mut records: Vec<Result<Record, &str>> =
            multi_record_event_records().into_iter().map(Ok).collect();
        records.insert(2, Err("bad frame"));
        records.push(Ok(Record::Event(sample_event(RecordType::EventV2, 2))));

        let items: Vec<_> = futures::stream::iter(records)
            .try_aggregate_events(AggregationPolicy::Lenient, None)
            .collect()
            .await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap_err(), &"bad frame");
        assert_eq!(items[1].as_ref().map(|e| e.len()), Ok(FIXTURE_RECORD_COUNT));
        assert_eq!(items[2].as_ref().map(|e| e.len()), Ok(1));
    }

    #[tokio::test(start_paused = true)]
    async fn fallible_idle_flush_releases_the_last_event() {
        let records = multi_record_event_records().into_iter().map(Ok::<_, ()>);
        let stream = futures::stream::iter(records).chain(futures::stream::pending());
        let mut events = Box::pin(
            stream.try_aggregate_events(AggregationPolicy::Lenient, Some(Duration::from_secs(1))),
        );

        let event = events.next().await.expect("idle flush should emit the buffered event");
        assert_eq!(event.map(|e| e.len()), Ok(FIXTURE_RECORD_COUNT));
    }

    #[tokio::test(start_paused = true)]
    async fn without_idle_flush_a_quiet_stream_holds_its_event() {
        let stream = futures::stream::iter(multi_record_event_records())
            .chain(futures::stream::pending());
        let mut events = Box::pin(stream.aggregate_events(AggregationPolicy::Lenient, None));

        let result = tokio::time::timeout(Duration::from_secs(5), events.next()).await;
        assert!(result.is_err(), "event should stay buffered without an idle flush");
    }
}
