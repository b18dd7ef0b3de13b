//! Integration tests for the producer/consumer handoff.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use asciiplay::{ChannelObserver, ChannelStatus, Frame, FrameChannel};

#[test]
fn frames_cross_threads_in_production_order() {
    let channel: Arc<FrameChannel<Frame>> = Arc::new(FrameChannel::new(10));

    let producer = {
        let channel = Arc::clone(&channel);
        thread::spawn(move || {
            for i in 0..100u8 {
                channel.push(Frame::video(vec![i; 4], 2, 2));
                if i % 10 == 0 {
                    channel.push(Frame::audio(vec![i as f32; 8]));
                }
            }
            channel.wait_drained();
            channel.close();
        })
    };

    let mut last_video = None;
    while let Some(frame) = channel.pop() {
        if let Frame::Video { buffer, .. } = frame {
            if let Some(previous) = last_video {
                assert_eq!(buffer[0], previous + 1);
            }
            last_video = Some(buffer[0]);
        }
    }
    producer.join().unwrap();
    assert_eq!(last_video, Some(99));
}

#[test]
fn backpressure_caps_buffered_frames() {
    struct MaxLen(Arc<AtomicUsize>);
    impl ChannelObserver for MaxLen {
        fn on_add(&self, status: &ChannelStatus) {
            self.0.fetch_max(status.len, Ordering::SeqCst);
        }
    }

    let max_len = Arc::new(AtomicUsize::new(0));
    let channel = Arc::new(FrameChannel::with_observer(
        3,
        MaxLen(Arc::clone(&max_len)),
    ));

    let producer = {
        let channel = Arc::clone(&channel);
        thread::spawn(move || {
            for i in 0..300 {
                channel.push(i);
            }
            channel.close();
        })
    };

    // A slow consumer forces the producer to block on the bound.
    let mut count = 0;
    while channel.pop().is_some() {
        count += 1;
        if count % 50 == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
    producer.join().unwrap();
    assert_eq!(count, 300);
    assert!(max_len.load(Ordering::SeqCst) <= 3);
}

#[test]
fn wait_drained_gates_teardown_until_consumer_finishes() {
    let channel = Arc::new(FrameChannel::new(5));
    let consumed = Arc::new(AtomicUsize::new(0));

    let consumer = {
        let channel = Arc::clone(&channel);
        let consumed = Arc::clone(&consumed);
        thread::spawn(move || {
            while let Some(_frame) = channel.pop() {
                thread::sleep(Duration::from_millis(2));
                consumed.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    for i in 0..20 {
        channel.push(i);
    }
    channel.wait_drained();

    // Everything pushed has been taken off the queue by now.
    assert!(channel.is_empty());
    assert!(!channel.has_data());

    channel.close();
    consumer.join().unwrap();
    assert_eq!(consumed.load(Ordering::SeqCst), 20);
}
