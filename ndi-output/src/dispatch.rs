//! Per-frame entry points
//!
//! Called by the host for every captured frame, possibly from two threads at
//! once (video and audio). Neither path logs, allocates in the steady state,
//! or waits on a lifecycle call: a frame that cannot be sent right now is
//! dropped.

use std::sync::atomic::Ordering;

use ndi_audio::{repack_planar, AudioData, AudioFourCC};
use ndi_video::VideoData;

use crate::host::MediaHost;
use crate::session::{AudioPath, NdiOutput, OutputState};
use crate::sink::{
    timecode_from_ns, FrameFormat, Sender, SinkLibrary, WireAudioFrame, WireVideoFrame,
    TIMECODE_SYNTHESIZE,
};

impl<H: MediaHost, L: SinkLibrary> NdiOutput<H, L> {
    fn accepting_frames(&self) -> bool {
        self.state.load(Ordering::Acquire) == OutputState::Capturing as u8
    }

    /// Convert if needed and queue one video frame on the sender
    pub fn raw_video(&self, frame: &VideoData<'_>) {
        if !self.accepting_frames() {
            return;
        }

        let Some(mut video) = self.video.try_lock() else {
            return;
        };
        let Some(video) = video.as_mut() else {
            return;
        };

        let descriptor = video.descriptor;
        if descriptor.width == 0 || descriptor.height == 0 {
            return;
        }

        let Some(sender) = self.sender.try_read() else {
            return;
        };
        let Some(sender) = sender.as_ref() else {
            return;
        };

        let (data, line_stride) = match video.conversion.as_mut() {
            Some(conversion) => {
                conversion.converter.convert(
                    frame.planes,
                    frame.linesize,
                    0,
                    descriptor.height,
                    conversion.buffer.as_mut_slice(),
                    conversion.linesize,
                );
                let used = conversion.linesize as usize * descriptor.height as usize;
                (&conversion.buffer.as_slice()[..used], conversion.linesize)
            }
            None => match frame.first_plane() {
                Some(plane) => plane,
                None => return,
            },
        };

        sender.send_video_async(&WireVideoFrame {
            xres: descriptor.width,
            yres: descriptor.height,
            fourcc: descriptor.fourcc,
            frame_rate_n: descriptor.frame_rate_n,
            frame_rate_d: descriptor.frame_rate_d,
            picture_aspect_ratio: 0.0,
            frame_format: FrameFormat::Progressive,
            timecode: timecode_from_ns(frame.timestamp),
            data,
            line_stride,
            metadata: None,
        });
    }

    /// Repack one block of planar audio and send it
    pub fn raw_audio(&self, frame: &AudioData<'_>) {
        if !self.accepting_frames() {
            return;
        }

        let Some(mut audio) = self.audio.try_lock() else {
            return;
        };
        let AudioPath {
            negotiated,
            scratch,
        } = &mut *audio;

        let Some(info) = *negotiated else {
            return;
        };
        if info.sample_rate == 0 || info.channels == 0 {
            return;
        }

        let Some(sender) = self.sender.try_read() else {
            return;
        };
        let Some(sender) = sender.as_ref() else {
            return;
        };

        let Some(data) = repack_planar(frame, info.channels, scratch) else {
            return;
        };

        sender.send_audio(&WireAudioFrame {
            sample_rate: info.sample_rate,
            channels: info.channels as u32,
            samples: frame.frames,
            timecode: TIMECODE_SYNTHESIZE,
            fourcc: AudioFourCC::Fltp,
            channel_stride: frame.channel_stride() as u32,
            data,
            metadata: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::OutputSettings;
    use crate::test_support::{FakeHost, FakeSink};
    use ndi_audio::AudioInfo;
    use ndi_video::{FourCC, PixelFormat};
    use std::sync::Arc;
    use std::thread;

    fn output(
        host: &Arc<FakeHost>,
        sink: &Arc<FakeSink>,
    ) -> NdiOutput<Arc<FakeHost>, FakeSink> {
        NdiOutput::new(OutputSettings::default(), host.clone(), sink.clone())
    }

    struct I444Frame {
        y: Vec<u8>,
        u: Vec<u8>,
        v: Vec<u8>,
        width: u32,
    }

    impl I444Frame {
        fn new(width: u32, height: u32) -> Self {
            let size = (width * height) as usize;
            Self {
                y: (0..size).map(|i| (i % 200) as u8).collect(),
                u: (0..size).map(|i| (i % 97) as u8).collect(),
                v: (0..size).map(|i| (i % 89) as u8).collect(),
                width,
            }
        }

        fn push<H: MediaHost, L: SinkLibrary>(&self, output: &NdiOutput<H, L>, timestamp: u64) {
            let planes: [&[u8]; 3] = [&self.y, &self.u, &self.v];
            let linesize = [self.width; 3];
            output.raw_video(&VideoData::new(&planes, &linesize, timestamp));
        }
    }

    fn push_audio<H: MediaHost, L: SinkLibrary>(
        output: &NdiOutput<H, L>,
        channels: usize,
        frames: usize,
    ) {
        let samples: Vec<Vec<f32>> = (0..channels)
            .map(|ch| (0..frames).map(|i| ch as f32 + i as f32 / 1000.0).collect())
            .collect();
        let planes: Vec<&[f32]> = samples.iter().map(Vec::as_slice).collect();
        output.raw_audio(&AudioData::new(&planes, frames as u32, 0));
    }

    #[test]
    fn test_frames_dropped_while_idle() {
        let host = FakeHost::av(PixelFormat::I444, 64, 8, 30.0);
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        let frame = I444Frame::new(64, 8);

        frame.push(&output, 0);
        push_audio(&output, 2, 1024);

        assert!(sink.log.videos.lock().is_empty());
        assert!(sink.log.audios.lock().is_empty());
        assert_eq!(output.audio_scratch_capacity(), 0);
        assert!(output.video_scratch_len().is_none());

        assert!(output.start());
        output.stop(0);

        frame.push(&output, 0);
        push_audio(&output, 2, 1024);

        assert!(sink.log.videos.lock().is_empty());
        assert!(sink.log.audios.lock().is_empty());
        assert_eq!(output.audio_scratch_capacity(), 0);
    }

    #[test]
    fn test_i444_frame_sent_as_uyvy() {
        let host = FakeHost::av(PixelFormat::I444, 1920, 1080, 29.97);
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        let frame = I444Frame::new(1920, 1080);

        assert!(output.start());
        frame.push(&output, 1_000_000_000);

        let videos = sink.log.videos.lock();
        assert_eq!(videos.len(), 1);

        let sent = &videos[0];
        assert_eq!(sent.sender, "obs-ndi output (changeme)");
        assert_eq!((sent.xres, sent.yres), (1920, 1080));
        assert_eq!(sent.fourcc, FourCC::UYVY);
        assert_eq!(sent.frame_rate_n, 2997);
        assert_eq!(sent.frame_rate_d, 100);
        assert_eq!(sent.line_stride, 3840);
        assert_eq!(sent.timecode, 10_000_000);
        assert_eq!(sent.data.len(), 3840 * 1080);

        for (row, k) in [(0usize, 0usize), (0, 959), (539, 17), (1079, 958)] {
            let src = row * 1920 + 2 * k;
            let dst = row * 3840 + 4 * k;
            assert_eq!(
                &sent.data[dst..dst + 4],
                &[frame.u[src], frame.y[src], frame.v[src], frame.y[src + 1]],
                "row {} pair {}",
                row,
                k
            );
        }
    }

    #[test]
    fn test_pass_through_is_zero_copy() {
        let host = FakeHost::av(PixelFormat::BGRA, 16, 4, 60.0);
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        assert!(output.start());

        let pixels = vec![7u8; 16 * 4 * 4 + 64];
        let planes: [&[u8]; 1] = [&pixels];
        output.raw_video(&VideoData::new(&planes, &[80], 250));

        let videos = sink.log.videos.lock();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].fourcc, FourCC::BGRA);
        assert_eq!(videos[0].line_stride, 80);
        assert_eq!(videos[0].timecode, 2);
        assert_eq!(videos[0].data_ptr, pixels.as_ptr() as usize);
        assert!(output.video_scratch_len().is_none());
    }

    #[test]
    fn test_pass_through_without_planes_is_dropped() {
        let host = FakeHost::av(PixelFormat::NV12, 16, 4, 60.0);
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        assert!(output.start());

        output.raw_video(&VideoData::new(&[], &[], 0));
        assert!(sink.log.videos.lock().is_empty());
    }

    #[test]
    fn test_zero_dimensions_drop_video() {
        let host = FakeHost::av(PixelFormat::NV12, 0, 0, 60.0);
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        assert!(output.start());

        let plane = [0u8; 16];
        let planes: [&[u8]; 1] = [&plane];
        output.raw_video(&VideoData::new(&planes, &[16], 0));
        assert!(sink.log.videos.lock().is_empty());
    }

    #[test]
    fn test_audio_repacked_and_sent() {
        let host = FakeHost::av(PixelFormat::NV12, 16, 4, 60.0);
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        assert!(output.start());

        push_audio(&output, 2, 4);

        let audios = sink.log.audios.lock();
        assert_eq!(audios.len(), 1);
        let sent = &audios[0];
        assert_eq!(sent.sample_rate, 48000);
        assert_eq!(sent.channels, 2);
        assert_eq!(sent.samples, 4);
        assert_eq!(sent.channel_stride, 16);
        assert_eq!(sent.timecode, TIMECODE_SYNTHESIZE);
        assert_eq!(sent.fourcc, AudioFourCC::Fltp);

        let samples: Vec<f32> = sent
            .data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let expected: Vec<f32> = (0..2)
            .flat_map(|ch| (0..4).map(move |i| ch as f32 + i as f32 / 1000.0))
            .collect();
        assert_eq!(samples, expected);
    }

    #[test]
    fn test_audio_scratch_grows_monotonically() {
        let host = FakeHost::av(PixelFormat::NV12, 16, 4, 60.0);
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        assert!(output.start());

        let mut running_max = 0;
        let mut reallocs = 0;
        for frames in [480usize, 1024, 512, 1024, 2048, 256] {
            let size = 2 * frames * 4;
            if size > running_max {
                reallocs += 1;
            }
            running_max = running_max.max(size);

            push_audio(&output, 2, frames);

            assert_eq!(output.audio_scratch_capacity(), running_max);
            assert_eq!(output.audio_scratch_reallocations(), reallocs);
        }

        // Reused across capture cycles
        output.stop(0);
        assert_eq!(output.audio_scratch_capacity(), running_max);
        assert!(output.start());
        push_audio(&output, 2, 1024);
        assert_eq!(output.audio_scratch_reallocations(), reallocs);
    }

    #[test]
    fn test_audio_missing_channel_is_dropped() {
        let host = FakeHost::new(
            None,
            Some(AudioInfo {
                sample_rate: 48000,
                channels: 4,
            }),
        );
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        assert!(output.start());

        push_audio(&output, 2, 256);
        assert!(sink.log.audios.lock().is_empty());

        push_audio(&output, 4, 256);
        assert_eq!(sink.log.audios.lock().len(), 1);
    }

    #[test]
    fn test_zero_rate_drops_audio() {
        let host = FakeHost::new(
            None,
            Some(AudioInfo {
                sample_rate: 0,
                channels: 2,
            }),
        );
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        assert!(output.start());

        push_audio(&output, 2, 256);
        assert!(sink.log.audios.lock().is_empty());
        assert_eq!(output.audio_scratch_capacity(), 0);
    }

    #[test]
    fn test_frames_racing_stop() {
        let host = FakeHost::av(PixelFormat::I444, 320, 180, 60.0);
        let sink = FakeSink::new();
        let output = output(&host, &sink);
        let frame = I444Frame::new(320, 180);

        for _ in 0..20 {
            assert!(output.start());

            thread::scope(|s| {
                s.spawn(|| {
                    for ts in 0..50 {
                        frame.push(&output, ts);
                    }
                });
                s.spawn(|| {
                    for _ in 0..50 {
                        push_audio(&output, 2, 256);
                    }
                });
                s.spawn(|| output.stop(0));
            });

            assert!(!output.has_sender());
        }

        let sent = sink.log.videos.lock().len();
        frame.push(&output, 0);
        assert_eq!(sink.log.videos.lock().len(), sent);
        assert_eq!(sink.log.live_senders(), 0);
    }
}
