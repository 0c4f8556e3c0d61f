//! Session context
//!
//! One `Session` holds what the viewer currently shows: the asset reference,
//! the material configuration (including the texture reference) and the busy
//! flag. It is passed explicitly to whatever needs it, so several independent
//! sessions can coexist. No locking is done here; callers sharing a session
//! across threads wrap it themselves.

use crate::material::MaterialConfig;

/// Identifies the session's asset reference at one point in time.
///
/// The epoch increases on every reference change, so a token taken before a
/// slow load can be compared afterwards to detect that the session moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    pub reference: String,
    pub epoch: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    asset_reference: Option<String>,
    material: MaterialConfig,
    busy: bool,
    epoch: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset_reference(&self) -> Option<&str> {
        self.asset_reference.as_deref()
    }

    pub fn has_model(&self) -> bool {
        self.asset_reference.is_some()
    }

    /// Replace the current asset reference; later results replace earlier ones
    pub fn set_asset_reference(&mut self, reference: Option<String>) {
        self.asset_reference = reference;
        self.epoch += 1;
    }

    pub fn texture_reference(&self) -> Option<&str> {
        self.material.texture_reference()
    }

    pub fn set_texture_reference(&mut self, reference: Option<String>) {
        self.material.set_texture_reference(reference);
    }

    pub fn material(&self) -> &MaterialConfig {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut MaterialConfig {
        &mut self.material
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn reference_token(&self) -> ReferenceToken {
        ReferenceToken {
            reference: self.asset_reference.clone().unwrap_or_default(),
            epoch: self.epoch,
        }
    }

    /// True while no reference change happened since `token` was taken
    pub fn is_current(&self, token: &ReferenceToken) -> bool {
        token.epoch == self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(!session.has_model());
        assert!(!session.is_busy());
        assert_eq!(session.reference_token().reference, "");
    }

    #[test]
    fn test_token_goes_stale_on_reference_change() {
        let mut session = Session::new();
        session.set_asset_reference(Some("a.glb".into()));
        let token = session.reference_token();
        assert!(session.is_current(&token));

        session.set_asset_reference(Some("b.glb".into()));
        assert!(!session.is_current(&token));
    }

    #[test]
    fn test_same_reference_set_twice_still_bumps_epoch() {
        let mut session = Session::new();
        session.set_asset_reference(Some("a.glb".into()));
        let token = session.reference_token();
        session.set_asset_reference(Some("a.glb".into()));
        assert!(!session.is_current(&token));
    }

    #[test]
    fn test_material_edits_keep_token_current() {
        let mut session = Session::new();
        session.set_asset_reference(Some("a.glb".into()));
        let token = session.reference_token();
        session.material_mut().set_roughness(0.1);
        session.set_texture_reference(Some("t.png".into()));
        assert!(session.is_current(&token));
        assert_eq!(session.texture_reference(), Some("t.png"));
    }
}
