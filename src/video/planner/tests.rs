use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

const FRAME_SECONDS: f64 = 1.0 / 30.0;

fn line(text: &str, start: f64, end: f64) -> CaptionLine {
    CaptionLine {
        text: text.to_string(),
        start,
        end,
    }
}

fn request(narration: f64, footage: f64, title: Option<&str>) -> PlanRequest {
    PlanRequest {
        narration: MediaSource {
            path: PathBuf::from("/work/voiceover.wav"),
            duration: narration,
        },
        background: FootageSource {
            path: PathBuf::from("/datasets/nature/clip.mp4"),
            duration: footage,
            size: TargetFrame::new(1920, 1080),
        },
        music: None,
        title: title.map(str::to_string),
        captions: vec![line("Hi there friend.", 0.0, 1.5), line("Bye now.", 8.0, 10.2)],
        aspect: AspectRatio::Vertical,
        quality: Quality::High,
    }
}

fn planner() -> TimelinePlanner {
    TimelinePlanner::new(TimelinePolicy::default())
}

fn assert_windows_inside(plan: &CompositionPlan) {
    let total = plan.total_duration;
    if let Some(title) = &plan.title {
        assert!(title.window.within(0.0, total));
    }
    for caption in &plan.captions {
        assert!(TimeWindow::new(caption.start, caption.end).within(0.0, total));
    }
    for track in &plan.audio_tracks {
        assert!(track.window.within(0.0, total), "{track:?}");
    }
    let bg = &plan.background;
    assert!(bg.subclip_start >= 0.0);
    assert!(bg.subclip_start + bg.subclip_duration <= bg.looped_duration() + 1e-9);
}

#[test]
fn title_extends_total_duration() {
    let plan = planner()
        .plan(&request(10.0, 60.0, Some("Daily facts")), &mut StdRng::seed_from_u64(1))
        .unwrap();

    assert_eq!(plan.total_duration, 14.0);
    assert_eq!(plan.caption_offset, 4.0);
    let title = plan.title.as_ref().unwrap();
    assert_eq!(title.window, TimeWindow::new(0.0, 4.0));
    assert_eq!(title.fade, 0.5);
    assert_eq!(title.font_size, 153);
    assert_eq!(title.wrap_width, 864);
    assert_eq!(plan.narration().unwrap().window, TimeWindow::new(4.0, 14.0));
    assert_eq!(plan.captions[0], line("Hi there friend.", 4.0, 5.5));
    assert_windows_inside(&plan);
}

#[test]
fn blank_title_is_treated_as_no_title() {
    let plan = planner()
        .plan(&request(10.0, 60.0, Some("   ")), &mut StdRng::seed_from_u64(1))
        .unwrap();

    assert!(plan.title.is_none());
    assert_eq!(plan.total_duration, 10.0);
    assert_eq!(plan.captions[0].start, 0.0);
}

#[test]
fn short_footage_is_looped_to_exact_length() {
    let plan = planner()
        .plan(&request(10.0, 2.0, Some("Loop")), &mut StdRng::seed_from_u64(2))
        .unwrap();

    let bg = &plan.background;
    assert!(bg.slowed_duration < 14.0);
    assert!(bg.looped_duration() >= 14.0);
    assert!((bg.subclip_duration - plan.total_duration).abs() <= FRAME_SECONDS);
    assert_windows_inside(&plan);
}

#[test]
fn music_bed_is_quiet_and_covers_everything() {
    let mut req = request(10.0, 60.0, Some("Music"));
    req.music = Some(MediaSource {
        path: PathBuf::from("/datasets/nature/bed.mp3"),
        duration: 5.0,
    });

    let plan = planner().plan(&req, &mut StdRng::seed_from_u64(3)).unwrap();

    let music = plan.music().unwrap();
    assert_eq!(music.gain, 0.15);
    assert_eq!(music.loop_count, 3);
    assert_eq!(music.window, TimeWindow::new(0.0, 14.0));
    assert_eq!(plan.narration().unwrap().gain, 1.0);
    assert_windows_inside(&plan);
}

#[test]
fn captions_past_the_end_are_clamped() {
    let mut req = request(10.0, 60.0, None);
    req.captions.push(line("late", 9.8, 10.4));

    let plan = planner().plan(&req, &mut StdRng::seed_from_u64(4)).unwrap();

    assert_eq!(plan.captions.last().unwrap().end, 10.0);
    assert_windows_inside(&plan);
}

#[test]
fn caption_placement_scales_with_frame() {
    let vertical = CaptionPlacement::for_frame(TargetFrame::new(1080, 1920), AspectRatio::Vertical);
    assert_eq!(vertical.anchor_x, 540);
    assert_eq!(vertical.anchor_y, 1632);
    // 96px boosted by 5%
    assert_eq!(vertical.font_size, 100);
    assert_eq!(vertical.max_width, 972);

    let landscape =
        CaptionPlacement::for_frame(TargetFrame::new(1280, 720), AspectRatio::Landscape);
    assert_eq!(landscape.font_size, 36);
    assert_eq!(landscape.anchor_y, 612);
}

#[test]
fn random_inputs_keep_every_window_on_the_timeline() {
    use rand::Rng;
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..200 {
        let narration = rng.gen_range(0.5..120.0);
        let footage = rng.gen_range(0.1..200.0);
        let mut req = request(narration, footage, rng.gen_bool(0.5).then_some("Title"));
        req.aspect = AspectRatio::ALL[rng.gen_range(0..4)];
        req.captions = vec![line("a", 0.0, narration.min(1.0)), line("b", narration * 0.5, narration)];
        if rng.gen_bool(0.5) {
            req.music = Some(MediaSource {
                path: PathBuf::from("bed.mp3"),
                duration: rng.gen_range(0.5..60.0),
            });
        }

        let plan = planner().plan(&req, &mut rng).unwrap();
        let expected = narration + if req.title.is_some() { 4.0 } else { 0.0 };
        assert!((plan.total_duration - expected).abs() < 1e-9);
        assert_eq!(plan.frame, plan.frame.even());
        assert_windows_inside(&plan);
    }
}

#[test]
fn precondition_failures_are_reported() {
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(
        planner().plan(&request(10.0, 0.0, None), &mut rng),
        Err(PlanError::EmptyBackground(0.0))
    );
    assert_eq!(
        planner().plan(&request(0.0, 10.0, None), &mut rng),
        Err(PlanError::InvalidNarration(0.0))
    );

    assert_eq!(
        planner().plan(&request(10.0, 1e-9, None), &mut rng),
        Err(PlanError::EmptyBackground(1e-9))
    );
}

#[test]
fn unusable_music_is_dropped_and_the_plan_continues() {
    let mut rng = StdRng::seed_from_u64(0);
    for duration in [0.0, f64::NAN, 1e-9] {
        let mut req = request(10.0, 10.0, Some("Title"));
        req.music = Some(MediaSource {
            path: PathBuf::from("bed.mp3"),
            duration,
        });

        let plan = planner().plan(&req, &mut rng).unwrap();
        assert!(plan.music().is_none());
        assert!(plan.narration().is_some());
        assert_eq!(plan.audio_tracks.len(), 1);
        assert_eq!(plan.total_duration, 14.0);
    }
}
