use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::job::{new_job_id, JobResult};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::segment::Segment;
use crate::storage::{cleanup_files, is_video, stored_filename, Storage};
use crate::subtitle::{generate_srt, read_srt};
use crate::transcribe::{SourceLanguage, TranscriberFactory, TranscriberTrait};
use crate::translate::{ModelRegistry, TranslationOutcome, TranslationService};

/// Pipeline behaviour switches taken from the configuration
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub source_language: SourceLanguage,
    pub burn_subtitles: bool,
    pub keep_intermediate: bool,
}

impl WorkflowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: SourceLanguage::parse(&config.transcriber.source_language),
            burn_subtitles: config.media.burn_subtitles,
            keep_intermediate: config.storage.keep_intermediate,
        }
    }
}

/// Drives extract -> transcribe -> translate -> SRT -> burn-in for one job at a time.
/// Engines are built once and shared by every job.
pub struct Workflow {
    settings: WorkflowSettings,
    storage: Storage,
    media: Arc<dyn MediaProcessorTrait>,
    transcriber: Arc<dyn TranscriberTrait>,
    translator: Arc<TranslationService>,
}

impl Workflow {
    /// Build the production engines from configuration and check the external tools
    pub async fn initialize(config: &Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        let transcriber = TranscriberFactory::create_transcriber(config.transcriber.clone());
        let registry = Arc::new(ModelRegistry::from_config(&config.translate));

        media.check_availability().await?;
        info!("Media processor: {}", media.get_version_info().await?);
        transcriber.check_availability().await?;

        let workflow = Self::with_components(
            WorkflowSettings::from_config(config),
            Storage::from_config(&config.storage),
            media,
            transcriber,
            Arc::new(TranslationService::new(registry)),
        );
        workflow.storage.ensure_dirs().await?;

        info!("Workflow ready (transcriber: {}, languages: {:?})",
              workflow.transcriber.name(), workflow.translator.registry().languages());
        Ok(workflow)
    }

    pub fn with_components(
        settings: WorkflowSettings,
        storage: Storage,
        media: Arc<dyn MediaProcessorTrait>,
        transcriber: Arc<dyn TranscriberTrait>,
        translator: Arc<TranslationService>,
    ) -> Self {
        Self {
            settings,
            storage,
            media,
            transcriber,
            translator,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn translator(&self) -> &TranslationService {
        &self.translator
    }

    /// Run the full pipeline for one stored upload. Never returns an error:
    /// fatal failures become `success = false` with the message.
    pub async fn process(&self, input_path: &Path, original_filename: &str, target_language: &str) -> JobResult {
        let job_id = new_job_id();
        info!("Starting job {} for {} (target: {})", job_id, original_filename, target_language);

        match self.run_pipeline(&job_id, input_path, original_filename, target_language).await {
            Ok(result) => {
                info!("Job {} completed with {} subtitles", job_id, result.subtitles.len());
                result
            }
            Err(e) => {
                error!("Error generating subtitles for job {}: {}", job_id, e);
                JobResult::failed(job_id, e.to_string())
            }
        }
    }

    async fn run_pipeline(
        &self,
        job_id: &str,
        input_path: &Path,
        original_filename: &str,
        target_language: &str,
    ) -> Result<JobResult> {
        let has_video = is_video(original_filename);
        let mut intermediate: Vec<PathBuf> = Vec::new();

        // Step 1: audio track
        let audio_path = if has_video || !self.transcriber.accepts_input(input_path) {
            let audio_path = self.storage.processed_path(&format!("{}_audio.wav", job_id));
            self.media.extract_audio(input_path, &audio_path).await?;
            intermediate.push(audio_path.clone());
            audio_path
        } else {
            input_path.to_path_buf()
        };

        // Step 2: transcribe
        let segments = self
            .transcriber
            .transcribe(&audio_path, &self.settings.source_language)
            .await?;

        // Step 3: translate, best effort
        let outcome = self.translator.translate_segments(&segments, target_language).await;
        if let Some(fallback) = &outcome.fallback {
            info!("Job {} keeps source-language subtitles: {}", job_id, fallback);
        }

        // Step 4: SRT
        let srt_file = format!("{}.srt", job_id);
        let srt_path = self.storage.processed_path(&srt_file);
        generate_srt(&outcome.segments, &srt_path).await?;

        // Step 5: processed media
        let processed_file = format!("{}_{}", job_id, stored_filename(original_filename));
        let processed_path = self.storage.processed_path(&processed_file);

        if has_video && self.settings.burn_subtitles {
            self.media.embed_subtitles(input_path, &srt_path, &processed_path).await?;
        } else {
            fs::copy(input_path, &processed_path).await?;
        }

        if !self.settings.keep_intermediate {
            cleanup_files(&intermediate).await;
        }

        Ok(JobResult::completed(
            job_id.to_string(),
            outcome.segments,
            srt_file,
            processed_file,
            has_video,
        ))
    }

    /// Extract audio from a media file
    pub async fn extract_audio(&self, input_path: &Path, audio_path: &Path) -> Result<PathBuf> {
        self.media.extract_audio(input_path, audio_path).await
    }

    /// Transcribe a media file straight to an SRT file
    pub async fn transcribe_to_srt(
        &self,
        input_path: &Path,
        output_path: &Path,
        language: Option<&str>,
    ) -> Result<Vec<Segment>> {
        let language = language
            .map(SourceLanguage::parse)
            .unwrap_or_else(|| self.settings.source_language.clone());

        let scratch = tempfile::tempdir()?;
        let audio_path = if self.transcriber.accepts_input(input_path) {
            input_path.to_path_buf()
        } else {
            self.media
                .extract_audio(input_path, &scratch.path().join("audio.wav"))
                .await?
        };

        let segments = self.transcriber.transcribe(&audio_path, &language).await?;
        generate_srt(&segments, output_path).await?;
        Ok(segments)
    }

    /// Translate an existing SRT file into another SRT file
    pub async fn translate_subtitles(
        &self,
        input_path: &Path,
        output_path: &Path,
        target_language: &str,
    ) -> Result<TranslationOutcome> {
        let segments = read_srt(input_path).await?;
        let outcome = self.translator.translate_segments(&segments, target_language).await;
        generate_srt(&outcome.segments, output_path).await?;
        Ok(outcome)
    }

    /// Burn subtitles into a video file
    pub async fn embed_subtitles(&self, video_path: &Path, subtitle_path: &Path, output_path: &Path) -> Result<()> {
        self.media.embed_subtitles(video_path, subtitle_path, output_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KaptionError;
    use crate::media::MockMediaProcessorTrait;
    use crate::translate::{EngineHandle, PairTranslator};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct ScriptedTranscriber {
        segments: Vec<Segment>,
        fail: bool,
        reads_any_input: bool,
        seen: Mutex<Vec<PathBuf>>,
    }

    impl ScriptedTranscriber {
        fn new(segments: Vec<Segment>) -> Self {
            Self { segments, fail: false, reads_any_input: true, seen: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { segments: vec![], fail: true, reads_any_input: true, seen: Mutex::new(Vec::new()) }
        }

        fn extracted_audio_only(segments: Vec<Segment>) -> Self {
            Self { reads_any_input: false, ..Self::new(segments) }
        }
    }

    #[async_trait]
    impl TranscriberTrait for ScriptedTranscriber {
        async fn transcribe(&self, audio_path: &Path, _language: &SourceLanguage) -> Result<Vec<Segment>> {
            self.seen.lock().unwrap().push(audio_path.to_path_buf());
            if self.fail {
                return Err(KaptionError::Transcriber("model crashed".to_string()));
            }
            Ok(self.segments.clone())
        }

        fn accepts_input(&self, _path: &Path) -> bool {
            self.reads_any_input
        }

        async fn check_availability(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct SpanishEngine;

    #[async_trait]
    impl PairTranslator for SpanishEngine {
        async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>> {
            Ok(texts.iter().map(|t| format!("es: {}", t)).collect())
        }

        fn model(&self) -> &str {
            "test/opus-mt-en-es"
        }
    }

    fn twenty_second_clip() -> Vec<Segment> {
        vec![
            Segment::new(1.0, 4.0, "Welcome to our subtitle generator"),
            Segment::new(5.0, 8.0, "This video demonstrates subtitle functionality"),
            Segment::new(9.0, 12.0, "You can upload your own videos"),
            Segment::new(13.0, 16.0, "And generate subtitles in multiple languages"),
            Segment::new(17.0, 20.0, "Thank you for using our service"),
        ]
    }

    fn translator() -> Arc<TranslationService> {
        let mut engines: HashMap<String, EngineHandle> = HashMap::new();
        engines.insert("en".to_string(), EngineHandle::Source);
        engines.insert("es".to_string(), EngineHandle::Pair(Arc::new(SpanishEngine)));
        Arc::new(TranslationService::new(Arc::new(ModelRegistry::new("en", "en_XX", engines))))
    }

    fn settings(burn_subtitles: bool) -> WorkflowSettings {
        WorkflowSettings {
            source_language: SourceLanguage::Code("en".to_string()),
            burn_subtitles,
            keep_intermediate: false,
        }
    }

    fn media_that_burns() -> MockMediaProcessorTrait {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_audio().times(1).returning(|_input, audio| {
            std::fs::write(audio, b"RIFF")?;
            Ok(audio.to_path_buf())
        });
        media.expect_embed_subtitles().times(1).returning(|_video, srt, output| {
            assert!(srt.exists(), "subtitles must be written before burning");
            std::fs::write(output, b"burned")?;
            Ok(())
        });
        media
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        storage: Storage,
        input: PathBuf,
    }

    fn fixture(filename: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("uploads"), dir.path().join("processed"));
        std::fs::create_dir_all(storage.uploads_dir()).unwrap();
        std::fs::create_dir_all(storage.processed_dir()).unwrap();
        let input = storage.upload_path(filename);
        std::fs::write(&input, b"media bytes").unwrap();
        Fixture { _dir: dir, storage, input }
    }

    #[tokio::test]
    async fn test_video_upload_end_to_end() {
        let fx = fixture("clip.mp4");
        let transcriber = Arc::new(ScriptedTranscriber::new(twenty_second_clip()));
        let workflow = Workflow::with_components(
            settings(true),
            fx.storage.clone(),
            Arc::new(media_that_burns()),
            transcriber.clone(),
            translator(),
        );

        let result = workflow.process(&fx.input, "clip.mp4", "es").await;

        assert!(result.success, "{:?}", result.error);
        assert!(result.has_video);
        assert_eq!(result.subtitles.len(), 5);
        assert_eq!(result.subtitles[0].text, "es: Welcome to our subtitle generator");
        assert_eq!(result.subtitles[4].start, 17.0);

        let srt_file = result.srt_file.clone().unwrap();
        let processed_file = result.processed_file.clone().unwrap();
        assert!(srt_file.ends_with(".srt"));
        let job_prefix = srt_file.trim_end_matches(".srt");
        assert_eq!(job_prefix, result.job_id);
        assert_eq!(processed_file, format!("{}_clip.mp4", job_prefix));

        let srt = std::fs::read_to_string(fx.storage.processed_path(&srt_file)).unwrap();
        assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:04,000\nes: Welcome"));
        assert_eq!(std::fs::read(fx.storage.processed_path(&processed_file)).unwrap(), b"burned");

        // The extracted audio went to the transcriber, then was removed
        let audio = fx.storage.processed_path(&format!("{}_audio.wav", result.job_id));
        assert_eq!(*transcriber.seen.lock().unwrap(), vec![audio.clone()]);
        assert!(!audio.exists());
    }

    #[tokio::test]
    async fn test_non_ascii_video_name_keeps_extension() {
        let fx = fixture("видео.mp4");
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_audio().times(1).returning(|_, audio| Ok(audio.to_path_buf()));
        media.expect_embed_subtitles().times(1).returning(|_video, _srt, output| {
            assert_eq!(output.extension().and_then(|e| e.to_str()), Some("mp4"));
            std::fs::write(output, b"burned")?;
            Ok(())
        });

        let workflow = Workflow::with_components(
            settings(true),
            fx.storage.clone(),
            Arc::new(media),
            Arc::new(ScriptedTranscriber::new(twenty_second_clip())),
            translator(),
        );
        let result = workflow.process(&fx.input, "видео.mp4", "en").await;

        assert!(result.success, "{:?}", result.error);
        assert!(fx.input.to_string_lossy().ends_with("_upload.mp4"));
        assert_eq!(result.processed_file, Some(format!("{}_upload.mp4", result.job_id)));
    }

    #[tokio::test]
    async fn test_audio_upload_is_transcribed_directly_and_copied() {
        let fx = fixture("memo.wav");
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_audio().times(0);
        media.expect_embed_subtitles().times(0);
        let transcriber = Arc::new(ScriptedTranscriber::new(twenty_second_clip()));

        let workflow = Workflow::with_components(
            settings(true), fx.storage.clone(), Arc::new(media), transcriber.clone(), translator(),
        );
        let result = workflow.process(&fx.input, "memo.wav", "en").await;

        assert!(result.success);
        assert!(!result.has_video);
        assert_eq!(result.subtitles, twenty_second_clip());
        assert_eq!(*transcriber.seen.lock().unwrap(), vec![fx.input.clone()]);

        let processed = fx.storage.processed_path(result.processed_file.as_deref().unwrap());
        assert_eq!(std::fs::read(processed).unwrap(), b"media bytes");
    }

    #[tokio::test]
    async fn test_wav_upload_is_resampled_when_transcriber_needs_it() {
        let fx = fixture("stereo_44k.wav");
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_audio().times(1).returning(|_input, audio| {
            std::fs::write(audio, b"RIFF16k")?;
            Ok(audio.to_path_buf())
        });
        media.expect_embed_subtitles().times(0);
        let transcriber = Arc::new(ScriptedTranscriber::extracted_audio_only(twenty_second_clip()));

        let workflow = Workflow::with_components(
            settings(true), fx.storage.clone(), Arc::new(media), transcriber.clone(), translator(),
        );
        let result = workflow.process(&fx.input, "stereo_44k.wav", "en").await;

        assert!(result.success, "{:?}", result.error);
        assert!(!result.has_video);
        let extracted = fx.storage.processed_path(&format!("{}_audio.wav", result.job_id));
        assert_eq!(*transcriber.seen.lock().unwrap(), vec![extracted.clone()]);
        assert!(!extracted.exists());

        let processed = fx.storage.processed_path(result.processed_file.as_deref().unwrap());
        assert_eq!(std::fs::read(processed).unwrap(), b"media bytes");
    }

    #[tokio::test]
    async fn test_burn_disabled_copies_video() {
        let fx = fixture("clip.mov");
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_audio().times(1).returning(|_, audio| Ok(audio.to_path_buf()));
        media.expect_embed_subtitles().times(0);

        let workflow = Workflow::with_components(
            settings(false),
            fx.storage.clone(),
            Arc::new(media),
            Arc::new(ScriptedTranscriber::new(twenty_second_clip())),
            translator(),
        );
        let result = workflow.process(&fx.input, "clip.mov", "es").await;

        assert!(result.success);
        let processed = fx.storage.processed_path(result.processed_file.as_deref().unwrap());
        assert_eq!(std::fs::read(processed).unwrap(), b"media bytes");
    }

    #[tokio::test]
    async fn test_unsupported_language_keeps_transcript() {
        let fx = fixture("clip.mp4");
        let workflow = Workflow::with_components(
            settings(true),
            fx.storage.clone(),
            Arc::new(media_that_burns()),
            Arc::new(ScriptedTranscriber::new(twenty_second_clip())),
            translator(),
        );

        let result = workflow.process(&fx.input, "clip.mp4", "xx").await;
        assert!(result.success);
        assert_eq!(result.subtitles, twenty_second_clip());
    }

    #[tokio::test]
    async fn test_transcription_failure_fails_job() {
        let fx = fixture("clip.mp4");
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_audio().times(1).returning(|_, audio| Ok(audio.to_path_buf()));
        media.expect_embed_subtitles().times(0);

        let workflow = Workflow::with_components(
            settings(true),
            fx.storage.clone(),
            Arc::new(media),
            Arc::new(ScriptedTranscriber::failing()),
            translator(),
        );
        let result = workflow.process(&fx.input, "clip.mp4", "es").await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("model crashed"));
        assert!(result.srt_file.is_none());
        assert!(!fx.storage.processed_path(&format!("{}.srt", result.job_id)).exists());
    }

    #[tokio::test]
    async fn test_embed_failure_leaves_partial_artifacts() {
        let fx = fixture("clip.avi");
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_audio().times(1).returning(|_, audio| {
            std::fs::write(audio, b"RIFF")?;
            Ok(audio.to_path_buf())
        });
        media.expect_embed_subtitles().times(1).returning(|_, _, _| {
            Err(KaptionError::Media("Subtitle embedding failed: encoder missing".to_string()))
        });

        let workflow = Workflow::with_components(
            settings(true),
            fx.storage.clone(),
            Arc::new(media),
            Arc::new(ScriptedTranscriber::new(twenty_second_clip())),
            translator(),
        );
        let result = workflow.process(&fx.input, "clip.avi", "es").await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("encoder missing"));
        assert!(fx.storage.processed_path(&format!("{}.srt", result.job_id)).exists());
        assert!(fx.storage.processed_path(&format!("{}_audio.wav", result.job_id)).exists());
    }

    #[tokio::test]
    async fn test_translate_subtitles_file() {
        let fx = fixture("unused.wav");
        let input = fx.storage.processed_path("in.srt");
        let output = fx.storage.processed_path("out.srt");
        generate_srt(&twenty_second_clip(), &input).await.unwrap();

        let workflow = Workflow::with_components(
            settings(true),
            fx.storage.clone(),
            Arc::new(MockMediaProcessorTrait::new()),
            Arc::new(ScriptedTranscriber::new(vec![])),
            translator(),
        );
        let outcome = workflow.translate_subtitles(&input, &output, "es").await.unwrap();

        assert!(outcome.is_translated());
        let written = read_srt(&output).await.unwrap();
        assert_eq!(written.len(), 5);
        assert_eq!(written[2].text, "es: You can upload your own videos");
        assert_eq!(written[2].end, 12.0);
    }
}
