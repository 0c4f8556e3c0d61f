//! Session orchestration

use crate::error::{Result, StudioError};
use kiln_core::{MaterialPatch, Session};
use kiln_gen::{GenerationClient, KilnConfig, Origin};
use kiln_media::{FfmpegDecoder, MediaAsset, MediaKind, MediaNormalizer};
use kiln_scene::{AssetBinder, BindOutcome, GltfLoader, SceneInstance, TemplateCache};
use std::fmt;
use std::sync::Arc;

/// Which session slot a submission filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Model,
    Texture,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Model => write!(f, "model"),
            Target::Texture => write!(f, "texture"),
        }
    }
}

/// What a prompt or file submission produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub target: Target,
    pub reference: String,
    /// `None` when a model file was used as-is
    pub origin: Option<Origin>,
    pub outcome: BindOutcome,
}

impl Submission {
    pub fn is_fallback(&self) -> bool {
        self.origin == Some(Origin::Fallback)
    }
}

/// One user's view: a session plus the components that fill it
pub struct Studio {
    session: Session,
    client: GenerationClient,
    normalizer: MediaNormalizer,
    binder: AssetBinder,
}

impl Studio {
    pub fn new(client: GenerationClient, normalizer: MediaNormalizer, binder: AssetBinder) -> Self {
        Self {
            session: Session::new(),
            client,
            normalizer,
            binder,
        }
    }

    /// Wire the configured provider, an ffmpeg-backed normalizer and a glTF
    /// binder with a fresh template cache
    pub fn from_config(config: &KilnConfig) -> kiln_core::Result<Self> {
        let client = GenerationClient::from_config(config)?;

        let ffmpeg = config.media.ffmpeg_path.clone();
        let ffprobe = config.media.ffprobe_path.clone();
        let normalizer = MediaNormalizer::new(
            move || FfmpegDecoder::new(ffmpeg.clone(), ffprobe.clone()),
            config.extract_options(),
        );

        let binder = AssetBinder::new(Arc::new(TemplateCache::new()), Arc::new(GltfLoader));
        Ok(Self::new(client, normalizer, binder))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    /// The currently bound scene, if `refresh` has run
    pub fn scene(&self) -> Option<&SceneInstance> {
        self.binder.instance()
    }

    /// Generate from a text prompt. With a model already loaded the prompt
    /// describes a texture for it, otherwise a new model.
    pub fn submit_prompt(&mut self, prompt: &str) -> Result<Submission> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(StudioError::EmptyPrompt);
        }
        self.begin()?;

        let target = if self.session.has_model() {
            Target::Texture
        } else {
            Target::Model
        };
        tracing::info!(%target, prompt, "prompt submitted");

        let result = match target {
            Target::Model => self.client.request_model(prompt),
            Target::Texture => self.client.request_texture(prompt),
        };
        self.session.set_busy(false);

        self.accept(target, result.asset_reference, Some(result.origin))
    }

    /// Use a dropped or selected file. Model files are shown directly;
    /// everything else is turned into a model through image generation.
    pub fn submit_file(&mut self, asset: &MediaAsset) -> Result<Submission> {
        self.begin()?;
        tracing::info!(source = %asset.source_name, kind = %asset.kind, "file submitted");

        let produced = if asset.kind == MediaKind::Model {
            self.client
                .store()
                .store_model(&asset.bytes)
                .map(|path| (path.to_string_lossy().into_owned(), None))
                .map_err(StudioError::from)
        } else {
            self.client
                .request_model_from_media(asset, &self.normalizer)
                .map(|result| (result.asset_reference, Some(result.origin)))
                .map_err(StudioError::from)
        };
        self.session.set_busy(false);

        let (reference, origin) = produced?;
        self.accept(Target::Model, reference, origin)
    }

    /// Forget the current model and texture
    pub fn reset(&mut self) {
        self.session.set_asset_reference(None);
        self.session.set_texture_reference(None);
        self.binder.release();
        tracing::info!("session reset");
    }

    /// Merge a partial material edit and re-apply it to the bound scene
    pub fn update_material(&mut self, patch: &MaterialPatch) -> Result<BindOutcome> {
        self.session.material_mut().apply(patch);
        self.refresh()
    }

    /// Bind the session's current reference and material
    pub fn refresh(&mut self) -> Result<BindOutcome> {
        let token = self.session.reference_token();
        let resolved = self.binder.resolve(&token)?;
        Ok(self.binder.apply(resolved, &self.session)?)
    }

    fn begin(&mut self) -> Result<()> {
        if self.session.is_busy() {
            tracing::warn!("submission rejected while busy");
            return Err(StudioError::Busy);
        }
        self.session.set_busy(true);
        Ok(())
    }

    /// Store the new reference and bind it. If binding fails the previous
    /// reference is restored so the session keeps showing what the scene shows.
    fn accept(&mut self, target: Target, reference: String, origin: Option<Origin>) -> Result<Submission> {
        let previous = match target {
            Target::Model => self.session.asset_reference().map(str::to_string),
            Target::Texture => self.session.texture_reference().map(str::to_string),
        };
        self.set_reference(target, Some(reference.clone()));

        match self.refresh() {
            Ok(outcome) => Ok(Submission {
                target,
                reference,
                origin,
                outcome,
            }),
            Err(e) => {
                tracing::warn!(%target, reference, error = %e, "could not bind result, keeping previous asset");
                self.set_reference(target, previous);
                Err(e)
            }
        }
    }

    fn set_reference(&mut self, target: Target, reference: Option<String>) {
        match target {
            Target::Model => self.session.set_asset_reference(reference),
            Target::Texture => self.session.set_texture_reference(reference),
        }
    }
}

impl fmt::Debug for Studio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Studio")
            .field("session", &self.session)
            .field("provider", &self.client.provider_name())
            .field("binder", &self.binder)
            .finish()
    }
}
