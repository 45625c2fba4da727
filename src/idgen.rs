use uuid::Uuid;

/// Prefix on every engine-minted identifier. Server-assigned ids never carry
/// it, so `is_local` is a reliable create-vs-update signal at submit time.
pub const LOCAL_ID_MARKER: &str = "local-";

/// Mints identifiers for nodes the server has not seen yet (chapters,
/// lessons, attachments staged in the editor). The serial makes ids easy to
/// follow in logs and tests; the uuid makes them collision-resistant for the
/// process lifetime.
#[derive(Debug, Default)]
pub struct IdGen {
    issued: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("{}{}-{}", LOCAL_ID_MARKER, self.issued, Uuid::new_v4().simple())
    }

    pub fn is_local(id: &str) -> bool {
        id.starts_with(LOCAL_ID_MARKER)
    }
}
