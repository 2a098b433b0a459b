//! Composer state for the hook + narration + CTA composite.
//!
//! There is one draft at a time. Selecting a clip replaces it wholesale;
//! the user's voice choice is the only thing carried over. Narration and
//! submission results are tagged with the generation they were issued for,
//! so a completion that lands after the draft moved on is discarded.

use studio_models::{
    output_name_slug, Clip, ClipId, Narration, NarrationRequest, RenderJobId, RenderRequest,
    RenderSubmitted, VoiceProvider,
};
use tracing::debug;

use crate::{Effect, Generation, StaleResult, Tagged, ValidationError, ValidationErrors};

/// Tagline used until the user edits it.
pub const DEFAULT_CTA_TAGLINE: &str = "Understand your audience.";

/// Four-step completion checklist, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepFlags {
    pub hook_ready: bool,
    pub body_ready: bool,
    pub cta_ready: bool,
    pub assemble_ready: bool,
}

impl StepFlags {
    pub fn complete() -> Self {
        Self {
            hook_ready: true,
            body_ready: true,
            cta_ready: true,
            assemble_ready: true,
        }
    }

    pub fn as_array(&self) -> [bool; 4] {
        [
            self.hook_ready,
            self.body_ready,
            self.cta_ready,
            self.assemble_ready,
        ]
    }

    pub fn all_complete(&self) -> bool {
        self.as_array().iter().all(|f| *f)
    }
}

/// The user-editable draft.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerDraft {
    pub selected_clip_id: Option<ClipId>,
    pub caption_text: String,
    pub body_script: String,
    /// Set only by a successful narration generation
    pub narration: Option<Narration>,
    pub voice_provider: VoiceProvider,
    pub voice_name: String,
    pub cta_tagline: String,
    pub output_name: String,
    pub step_flags: StepFlags,
}

impl Default for ComposerDraft {
    fn default() -> Self {
        let provider = VoiceProvider::default();
        Self {
            selected_clip_id: None,
            caption_text: String::new(),
            body_script: String::new(),
            narration: None,
            voice_provider: provider,
            voice_name: provider.default_voice().to_string(),
            cta_tagline: DEFAULT_CTA_TAGLINE.to_string(),
            output_name: String::new(),
            step_flags: StepFlags::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComposerState {
    draft: ComposerDraft,
    /// Bumped when the draft is replaced
    draft_generation: Generation,
    /// Bumped when the draft is replaced or the script materially changes
    narration_generation: Generation,
    narration_error: Option<String>,
    submit_error: Option<String>,
    last_submitted: Option<RenderJobId>,
}

impl ComposerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &ComposerDraft {
        &self.draft
    }

    pub fn draft_generation(&self) -> Generation {
        self.draft_generation
    }

    pub fn narration_error(&self) -> Option<&str> {
        self.narration_error.as_deref()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn last_submitted(&self) -> Option<&RenderJobId> {
        self.last_submitted.as_ref()
    }

    /// Replace the draft with one built from `clip`.
    ///
    /// Any previously generated narration is discarded: it was timed for
    /// a different hook.
    pub fn select_clip(&mut self, clip: &Clip) {
        let voice_provider = self.draft.voice_provider;
        let voice_name = std::mem::take(&mut self.draft.voice_name);

        self.draft = ComposerDraft {
            selected_clip_id: Some(clip.id.clone()),
            caption_text: clip.caption_text.clone(),
            output_name: output_name_slug(&clip.caption_text),
            voice_provider,
            voice_name,
            ..ComposerDraft::default()
        };
        self.draft_generation.bump();
        self.narration_generation.bump();
        self.narration_error = None;
        self.submit_error = None;
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.draft.caption_text = caption.into();
    }

    /// Update the body script. A material change (ignoring surrounding
    /// whitespace) invalidates the generated narration.
    pub fn set_script(&mut self, script: impl Into<String>) {
        let script = script.into();
        if script.trim() != self.draft.body_script.trim() {
            self.draft.narration = None;
            self.narration_generation.bump();
        }
        self.draft.body_script = script;
    }

    /// Switch provider; the voice resets to the provider's default.
    pub fn set_provider(&mut self, provider: VoiceProvider) {
        if provider == self.draft.voice_provider {
            return;
        }
        self.draft.voice_provider = provider;
        self.draft.voice_name = provider.default_voice().to_string();
    }

    pub fn set_voice(&mut self, voice: &str) -> Result<(), ValidationError> {
        if !self.draft.voice_provider.has_voice(voice) {
            return Err(ValidationError::UnknownVoice {
                provider: self.draft.voice_provider,
                voice: voice.to_string(),
            });
        }
        self.draft.voice_name = voice.to_string();
        Ok(())
    }

    pub fn set_cta_tagline(&mut self, tagline: impl Into<String>) {
        self.draft.cta_tagline = tagline.into();
    }

    pub fn set_output_name(&mut self, name: impl Into<String>) {
        self.draft.output_name = name.into();
    }

    /// Narration can only be generated from a non-empty script.
    pub fn can_generate_narration(&self) -> bool {
        !self.draft.body_script.trim().is_empty()
    }

    /// Build a narration request for the current script and voice.
    ///
    /// The caller keeps the trigger disabled while the request is in flight.
    pub fn narration_request(&mut self) -> Result<Tagged<NarrationRequest>, ValidationError> {
        if !self.can_generate_narration() {
            return Err(ValidationError::MissingScript);
        }
        self.narration_error = None;
        Ok(Tagged::new(
            self.narration_generation,
            NarrationRequest {
                script: self.draft.body_script.trim().to_string(),
                voice: self.draft.voice_name.clone(),
                provider: self.draft.voice_provider,
            },
        ))
    }

    /// Store a generated narration track if it still matches the draft.
    pub fn apply_narration(&mut self, result: Tagged<Narration>) -> Result<(), StaleResult> {
        self.check_narration_generation(result.generation)?;
        self.draft.narration = Some(result.value);
        Ok(())
    }

    /// Record a narration failure. Script, provider and voice are untouched.
    pub fn narration_failed(
        &mut self,
        generation: Generation,
        message: impl Into<String>,
    ) -> Result<(), StaleResult> {
        self.check_narration_generation(generation)?;
        self.narration_error = Some(message.into());
        Ok(())
    }

    fn check_narration_generation(&self, generation: Generation) -> Result<(), StaleResult> {
        if generation != self.narration_generation {
            debug!(
                received = %generation,
                current = %self.narration_generation,
                "Discarding stale narration result"
            );
            return Err(StaleResult {
                target: "narration",
                received: generation,
                current: self.narration_generation,
            });
        }
        Ok(())
    }

    /// Check submission preconditions, reporting every missing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        if self.draft.selected_clip_id.is_none() {
            errors.push(ValidationError::NoClipSelected);
        }
        if self.draft.body_script.trim().is_empty() {
            errors.push(ValidationError::MissingScript);
        }
        if self.draft.output_name.trim().is_empty() {
            errors.push(ValidationError::MissingOutputName);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// Build the render submission for the current draft.
    pub fn render_request(&mut self) -> Result<Tagged<RenderRequest>, ValidationErrors> {
        self.validate()?;
        let Some(hook_clip_id) = self.draft.selected_clip_id.clone() else {
            return Err(ValidationError::NoClipSelected.into());
        };
        self.submit_error = None;

        Ok(Tagged::new(
            self.draft_generation,
            RenderRequest {
                hook_clip_id,
                hook_caption: self.draft.caption_text.clone(),
                body_script: self.draft.body_script.trim().to_string(),
                body_audio_file: self.draft.narration.as_ref().map(|n| n.audio_file.clone()),
                cta_tagline: self.draft.cta_tagline.clone(),
                output_name: self.draft.output_name.trim().to_string(),
            },
        ))
    }

    /// Apply an accepted submission.
    ///
    /// The queue is refreshed either way: the job exists on the server even
    /// if the draft that created it has since been replaced. Step flags are
    /// only marked when the draft is still the one that was submitted.
    pub fn apply_submitted(&mut self, result: Tagged<RenderSubmitted>) -> Vec<Effect> {
        if result.generation == self.draft_generation {
            self.draft.step_flags = StepFlags::complete();
            self.last_submitted = Some(result.value.id);
        } else {
            debug!(
                render_job_id = %result.value.id,
                "Submission completed for a replaced draft"
            );
        }
        vec![Effect::RefreshQueue]
    }

    /// Record a failed submission. Step flags stay as they were.
    pub fn submit_failed(
        &mut self,
        generation: Generation,
        message: impl Into<String>,
    ) -> Result<(), StaleResult> {
        if generation != self.draft_generation {
            return Err(StaleResult {
                target: "render submission",
                received: generation,
                current: self.draft_generation,
            });
        }
        self.submit_error = Some(message.into());
        Ok(())
    }
}
