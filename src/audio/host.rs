//! Duplex audio host using CPAL (Cross-Platform Audio Library).
//!
//! The host owns one input and one output stream on the same format. Input
//! blocks travel over a bounded queue to the output callback, which pairs
//! them with the output buffer and drives [`Scheduler::process`]. The output
//! callback tolerates missing input (device dropout) by processing with
//! whatever frames arrived; the scheduler's fill accounting absorbs the gap.

use crate::config::Config;
use crate::error::{BleepError, Result};
use crate::pipeline::Scheduler;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, bounded};
use std::collections::VecDeque;

/// Input blocks buffered between the two stream callbacks.
const QUEUE_BLOCKS: usize = 32;

/// Run `f` with stderr routed to /dev/null, then restore it.
///
/// Opening and enumerating duplex pairs makes the ALSA/JACK/PipeWire
/// backends chatter on stderr; every probe in this module wraps itself in
/// this. Swaps fd 2 via `libc::dup`/`dup2`, so no other thread may touch
/// stderr while `f` runs.
#[cfg(unix)]
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

#[cfg(not(unix))]
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

/// List available input and output device names.
pub fn list_devices() -> Result<(Vec<String>, Vec<String>)> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let inputs = host
            .input_devices()
            .map_err(|e| BleepError::AudioStream {
                message: format!("Failed to enumerate input devices: {}", e),
            })?
            .filter_map(|d| d.name().ok())
            .collect();
        let outputs = host
            .output_devices()
            .map_err(|e| BleepError::AudioStream {
                message: format!("Failed to enumerate output devices: {}", e),
            })?
            .filter_map(|d| d.name().ok())
            .collect();
        Ok((inputs, outputs))
    })
}

fn find_input_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    with_suppressed_stderr(|| match name {
        Some(wanted) => {
            let devices = host.input_devices().map_err(|e| BleepError::AudioStream {
                message: format!("Failed to enumerate devices: {}", e),
            })?;
            for device in devices {
                if let Ok(device_name) = device.name()
                    && device_name == wanted
                {
                    return Ok(device);
                }
            }
            Err(BleepError::AudioDeviceNotFound {
                device: wanted.to_string(),
            })
        }
        None => host
            .default_input_device()
            .ok_or_else(|| BleepError::AudioDeviceNotFound {
                device: "default".to_string(),
            }),
    })
}

fn find_output_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    with_suppressed_stderr(|| match name {
        Some(wanted) => {
            let devices = host.output_devices().map_err(|e| BleepError::AudioStream {
                message: format!("Failed to enumerate devices: {}", e),
            })?;
            for device in devices {
                if let Ok(device_name) = device.name()
                    && device_name == wanted
                {
                    return Ok(device);
                }
            }
            Err(BleepError::AudioDeviceNotFound {
                device: wanted.to_string(),
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| BleepError::AudioDeviceNotFound {
                device: "default".to_string(),
            }),
    })
}

/// Top up `carry` from the queue until it can cover `needed` samples.
fn fill_from_queue(carry: &mut VecDeque<f32>, queue: &Receiver<Vec<f32>>, needed: usize) {
    while carry.len() < needed {
        match queue.try_recv() {
            Ok(block) => carry.extend(block),
            Err(_) => break,
        }
    }
}

/// A running duplex stream pair feeding a [`Scheduler`].
pub struct DuplexHost {
    _input: cpal::Stream,
    _output: cpal::Stream,
}

impl DuplexHost {
    /// Open both devices at the configured format and start streaming.
    pub fn start(config: &Config, mut scheduler: Scheduler) -> Result<Self> {
        let host = cpal::default_host();
        let input_device = find_input_device(&host, config.audio.input_device.as_deref())?;
        let output_device = find_output_device(&host, config.audio.output_device.as_deref())?;

        let stream_config = cpal::StreamConfig {
            channels: config.audio.channels as u16,
            sample_rate: cpal::SampleRate(config.audio.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.audio.period_size as u32),
        };

        let (block_tx, block_rx) = bounded::<Vec<f32>>(QUEUE_BLOCKS);

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        let input_stream = input_device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Queue full means the output side stalled; dropping the
                    // block here only shortens the input the scheduler sees.
                    let _ = block_tx.try_send(data.to_vec());
                },
                err_callback,
                None,
            )
            .map_err(|e| BleepError::AudioStream {
                message: format!("Failed to build input stream: {}", e),
            })?;

        let mut carry: VecDeque<f32> = VecDeque::new();
        let mut scratch: Vec<f32> = Vec::new();
        let output_stream = output_device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill_from_queue(&mut carry, &block_rx, data.len());
                    let take = carry.len().min(data.len());
                    scratch.clear();
                    scratch.extend(carry.drain(..take));
                    scheduler.process(&scratch, data);
                },
                err_callback,
                None,
            )
            .map_err(|e| BleepError::AudioStream {
                message: format!("Failed to build output stream: {}", e),
            })?;

        input_stream.play().map_err(|e| BleepError::AudioStream {
            message: format!("Failed to start input stream: {}", e),
        })?;
        output_stream.play().map_err(|e| BleepError::AudioStream {
            message: format!("Failed to start output stream: {}", e),
        })?;

        Ok(Self {
            _input: input_stream,
            _output: output_stream,
        })
    }

    /// Stop streaming and release the devices.
    pub fn stop(self) {
        drop(self);
    }
}
