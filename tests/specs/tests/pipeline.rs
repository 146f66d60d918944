// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios exercising the full packet flow: input drivers
//! committing through post-processing chains into listeners, listeners
//! bridging into outputs, and outputs draining through pre-processing
//! chains into their drivers.

use std::sync::Arc;
use std::time::Duration;

use tactile::chain::listener_fn;
use tactile::event::{Event, TouchPhase, TouchRect};
use tactile::input::Input;
use tactile::options::Options;
use tactile::output::Output;
use tactile::packet::Packet;
use tactile::registry::LayerRegistry;
use tactile::test_support::{
    Duplicate, DropLeadingZero, FeedInput, Identity, Recorder, RecordingOutput,
};

use tactile_specs::{event, raw, WAIT};

// -- Input pipeline -----------------------------------------------------------

#[test]
fn raw_packet_reaches_bound_listener() -> anyhow::Result<()> {
    let driver = FeedInput::new();
    let recorder = Recorder::new();

    let input = Input::new("src1", &driver, &Options::new())?;
    input.bind(recorder.clone());

    driver.feed().push(raw(&[0xde, 0xad, 0xbe, 0xef]));

    assert!(recorder.wait_for(1, WAIT));
    let entries = recorder.entries();
    assert_eq!(entries[0].0, "src1");
    assert_eq!(entries[0].1.serialize().as_ref(), [0xde, 0xad, 0xbe, 0xef]);
    Ok(())
}

#[test]
fn filter_layer_drops_matching_packets() -> anyhow::Result<()> {
    let driver = FeedInput::new();
    let recorder = Recorder::new();

    let mut input = Input::new("src", &driver, &Options::new())?;
    input.polling_stop()?;
    input.push_post_processing_engine(&DropLeadingZero, &Options::new())?;
    input.bind(recorder.clone());
    input.polling_start()?;

    let feed = driver.feed();
    feed.push(raw(&[0x00, 0x01]));
    feed.push(raw(&[0x10, 0x20]));

    assert!(recorder.wait_for(1, WAIT));
    let entries = recorder.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1, raw(&[0x10, 0x20]));
    Ok(())
}

#[test]
fn duplicating_layer_delivers_twice() -> anyhow::Result<()> {
    let driver = FeedInput::new();
    let recorder = Recorder::new();

    let mut input = Input::new("src", &driver, &Options::new())?;
    input.polling_stop()?;
    input.push_post_processing_engine(&Duplicate, &Options::new())?;
    input.bind(recorder.clone());
    input.polling_start()?;

    driver.feed().push(raw(&[0x42]));

    assert!(recorder.wait_for(2, WAIT));
    let entries = recorder.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], entries[1]);
    Ok(())
}

#[test]
fn stopped_input_terminates_its_worker() -> anyhow::Result<()> {
    let driver = FeedInput::new();
    let recorder = Recorder::new();

    let mut input = Input::new("src", &driver, &Options::new())?;
    input.bind(recorder.clone());

    let feed = driver.feed();
    feed.push(raw(&[1]));
    assert!(recorder.wait_for(1, WAIT));

    input.polling_stop()?;

    feed.push(raw(&[2]));
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(recorder.len(), 1);
    Ok(())
}

// -- Output pipeline ----------------------------------------------------------

#[test]
fn output_transmits_in_submission_order() -> anyhow::Result<()> {
    let recorder = Recorder::new();
    let output = Output::new("net0", &RecordingOutput::new(recorder.clone()), &Options::new())?;

    let a = raw(&[0xaa]);
    let b = raw(&[0xbb]);
    let c = raw(&[0xcc]);
    output.transmit("caller", &a)?;
    output.transmit("caller", &b)?;
    output.transmit("caller", &c)?;

    assert!(recorder.wait_for(3, WAIT));
    let entries = recorder.entries();
    assert_eq!(entries[0].1, a);
    assert_eq!(entries[1].1, b);
    assert_eq!(entries[2].1, c);
    Ok(())
}

#[test]
fn dropping_a_loaded_output_terminates_cleanly() -> anyhow::Result<()> {
    let recorder = Recorder::new();
    let output = Output::new("net0", &RecordingOutput::new(recorder.clone()), &Options::new())?;

    for i in 0..100u8 {
        output.transmit("caller", &raw(&[i]))?;
    }
    drop(output);
    // Reaching this point within the harness timeout is the property:
    // the worker terminated and queued packets were released.
    Ok(())
}

// -- Event packets ------------------------------------------------------------

#[test]
fn copied_event_packet_outlives_original() -> anyhow::Result<()> {
    let original = event(&[
        (TouchPhase::Began, 0.0, 0.0, 10.0, 10.0),
        (TouchPhase::Moved, 5.0, 5.0, 2.0, 2.0),
    ]);
    let packet = Packet::event(original);
    let copy = packet.clone();
    drop(packet);

    let decoded = Event::from_bytes(&copy.serialize())?;
    assert_eq!(decoded.touch_count(), 2);
    assert_eq!(decoded.touches()[0].phase, TouchPhase::Began);
    assert_eq!(decoded.touches()[0].bounds, TouchRect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(decoded.touches()[1].phase, TouchPhase::Moved);
    assert_eq!(decoded.touches()[1].bounds, TouchRect::new(5.0, 5.0, 2.0, 2.0));
    Ok(())
}

// -- Registry-driven chains ---------------------------------------------------

#[test]
fn registered_layer_passes_a_thousand_packets_in_order() -> anyhow::Result<()> {
    let registry = LayerRegistry::new("layer");
    registry.register("id", Arc::new(Identity))?;
    let driver = registry.get("id").ok_or_else(|| anyhow::anyhow!("driver missing"))?;

    let driver_handle = FeedInput::new();
    let recorder = Recorder::new();
    let mut input = Input::new("src", &driver_handle, &Options::new())?;
    input.polling_stop()?;
    input.push_post_processing_engine(driver.as_ref(), &Options::new())?;
    input.bind(recorder.clone());
    input.polling_start()?;

    let feed = driver_handle.feed();
    for i in 0..1000u16 {
        feed.push(raw(&i.to_le_bytes()));
    }

    assert!(recorder.wait_for(1000, WAIT));
    let entries = recorder.entries();
    assert_eq!(entries.len(), 1000);
    for (i, (_, packet)) in entries.iter().enumerate() {
        assert_eq!(packet.serialize().as_ref(), (i as u16).to_le_bytes());
    }
    Ok(())
}

// -- Input feeding an output --------------------------------------------------

#[test]
fn listener_bridges_input_into_output() -> anyhow::Result<()> {
    let recorder = Recorder::new();
    let output =
        Arc::new(Output::new("net0", &RecordingOutput::new(recorder.clone()), &Options::new())?);

    let driver = FeedInput::new();
    let input = Input::new("pad", &driver, &Options::new())?;
    let bridge = Arc::clone(&output);
    input.bind(listener_fn(move |from: &str, packet: &Packet| bridge.transmit(from, packet)));

    driver.feed().push(raw(&[0x99, 0x98]));

    assert!(recorder.wait_for(1, WAIT));
    let entries = recorder.entries();
    assert_eq!(entries[0].0, "pad");
    assert_eq!(entries[0].1, raw(&[0x99, 0x98]));
    Ok(())
}
