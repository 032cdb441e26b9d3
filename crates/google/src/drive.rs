//! Google Drive folder and file helpers.
//!
//! [`DriveApi`] is the set of primitive Drive v3 calls; [`DriveClient`]
//! implements it over HTTP. The helper functions in this module build the
//! higher-level operations (find-or-create, copy with overwrite, duplicate
//! folder consolidation) on top of any `DriveApi`.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::http::ApiClient;

/// Default Drive API v3 endpoint.
pub const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com/drive/v3";

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const FILE_FIELDS: &str = "id,name,parents";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,parents)";

/// File or folder metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub parents: Vec<String>,
}

/// Primitive Drive operations.
pub trait DriveApi {
    /// All non-paginated results of a `files.list` search query.
    fn list(&self, query: &str) -> Result<Vec<DriveFile>>;

    fn get(&self, file_id: &str) -> Result<DriveFile>;

    /// Create a folder, optionally inside `parent_id`.
    fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<DriveFile>;

    fn delete(&self, file_id: &str) -> Result<()>;

    fn rename(&self, file_id: &str, new_name: &str) -> Result<DriveFile>;

    /// Add `add_parent` to a file's parents, optionally removing `remove_parent`.
    fn move_file(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parent: Option<&str>,
    ) -> Result<DriveFile>;

    /// Copy a file under a new name into `parents`.
    fn copy(&self, file_id: &str, new_name: &str, parents: &[String]) -> Result<DriveFile>;
}

/// Drive API v3 over HTTP.
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: ApiClient,
    base_url: String,
}

impl DriveClient {
    pub fn new(http: ApiClient) -> Self {
        Self {
            http,
            base_url: DEFAULT_DRIVE_URL.to_string(),
        }
    }

    /// Use a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.base_url, file_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

impl DriveApi for DriveClient {
    fn list(&self, query: &str) -> Result<Vec<DriveFile>> {
        let url = format!("{}/files", self.base_url);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("q", query), ("spaces", "drive"), ("fields", LIST_FIELDS)];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let page: FileList = self.http.get_json(&url, &params)?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }

    fn get(&self, file_id: &str) -> Result<DriveFile> {
        self.http
            .get_json(&self.file_url(file_id), &[("fields", FILE_FIELDS)])
    }

    fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<DriveFile> {
        let mut metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
        });
        if let Some(parent) = parent_id {
            metadata["parents"] = json!([parent]);
        }

        let url = format!("{}/files", self.base_url);
        self.http
            .post_json(&url, &[("fields", FILE_FIELDS)], &metadata)
    }

    fn delete(&self, file_id: &str) -> Result<()> {
        self.http.delete(&self.file_url(file_id))
    }

    fn rename(&self, file_id: &str, new_name: &str) -> Result<DriveFile> {
        self.http.patch_json(
            &self.file_url(file_id),
            &[("fields", FILE_FIELDS)],
            &json!({ "name": new_name }),
        )
    }

    fn move_file(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parent: Option<&str>,
    ) -> Result<DriveFile> {
        let mut params = vec![("addParents", add_parent), ("fields", FILE_FIELDS)];
        if let Some(remove) = remove_parent {
            params.push(("removeParents", remove));
        }

        self.http
            .patch_json(&self.file_url(file_id), &params, &json!({}))
    }

    fn copy(&self, file_id: &str, new_name: &str, parents: &[String]) -> Result<DriveFile> {
        let url = format!("{}/copy", self.file_url(file_id));
        self.http.post_json(
            &url,
            &[("fields", FILE_FIELDS)],
            &json!({ "name": new_name, "parents": parents }),
        )
    }
}

/// Quote a value for use inside a Drive query string literal.
pub fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn in_parent_clause(parent_id: Option<&str>) -> String {
    parent_id
        .map(|parent| format!(" and '{}' in parents", escape_query_literal(parent)))
        .unwrap_or_default()
}

/// Query matching non-trashed folders named `name`.
pub fn folder_query(name: &str, parent_id: Option<&str>) -> String {
    format!(
        "mimeType='{}' and name='{}' and trashed=false{}",
        FOLDER_MIME_TYPE,
        escape_query_literal(name),
        in_parent_clause(parent_id)
    )
}

/// Query matching non-trashed files of any type named `name`.
pub fn file_query(name: &str, parent_id: Option<&str>) -> String {
    format!(
        "name='{}' and trashed=false{}",
        escape_query_literal(name),
        in_parent_clause(parent_id)
    )
}

/// Query matching the non-trashed children of a folder.
pub fn children_query(folder_id: &str) -> String {
    format!(
        "'{}' in parents and trashed=false",
        escape_query_literal(folder_id)
    )
}

/// Every folder named `name`, optionally restricted to `parent_id`.
pub fn find_folders<D: DriveApi + ?Sized>(
    drive: &D,
    name: &str,
    parent_id: Option<&str>,
) -> Result<Vec<DriveFile>> {
    drive.list(&folder_query(name, parent_id))
}

/// Id of the first folder named `name`.
pub fn find_folder<D: DriveApi + ?Sized>(
    drive: &D,
    name: &str,
    parent_id: Option<&str>,
) -> Result<Option<String>> {
    Ok(find_folders(drive, name, parent_id)?
        .into_iter()
        .next()
        .map(|folder| folder.id))
}

/// Id of the first file named `name`.
pub fn find_file<D: DriveApi + ?Sized>(
    drive: &D,
    name: &str,
    parent_id: Option<&str>,
) -> Result<Option<String>> {
    Ok(drive
        .list(&file_query(name, parent_id))?
        .into_iter()
        .next()
        .map(|file| file.id))
}

/// Return the folder named `name`, creating it only if none exists.
///
/// When several exist, the first is returned and a warning is logged; use
/// [`find_or_create_folder`] to merge them instead.
pub fn ensure_folder<D: DriveApi + ?Sized>(
    drive: &D,
    name: &str,
    parent_id: Option<&str>,
) -> Result<DriveFile> {
    let existing = find_folders(drive, name, parent_id)?;

    match existing.first() {
        Some(first) => {
            if existing.len() > 1 {
                log::warn!(
                    "Multiple folders named '{}' found in the same location, using {}",
                    name,
                    first.id
                );
            }
            drive.get(&first.id)
        }
        None => drive.create_folder(name, parent_id),
    }
}

/// Copy a presentation into `parents` under `new_name`.
///
/// With `overwrite`, same-named files already in any of the parents are
/// deleted first.
pub fn copy_presentation<D: DriveApi + ?Sized>(
    drive: &D,
    template_id: &str,
    new_name: &str,
    parents: &[String],
    overwrite: bool,
) -> Result<DriveFile> {
    if overwrite {
        for parent in parents {
            if let Some(existing) = find_file(drive, new_name, Some(parent))? {
                log::info!("Overwriting '{}' ({}) in folder {}", new_name, existing, parent);
                drive.delete(&existing)?;
            }
        }
    }

    drive.copy(template_id, new_name, parents)
}

/// Return the single folder named `name`, creating or merging as needed.
///
/// With no match the folder is created. With several, the children of every
/// duplicate are moved into the first folder and the emptied duplicates are
/// deleted. A duplicate that cannot be deleted is logged and left in place.
pub fn find_or_create_folder<D: DriveApi + ?Sized>(
    drive: &D,
    name: &str,
    parent_id: Option<&str>,
) -> Result<DriveFile> {
    let mut existing = find_folders(drive, name, parent_id)?.into_iter();

    let Some(target) = existing.next() else {
        return drive.create_folder(name, parent_id);
    };

    let duplicates: Vec<DriveFile> = existing.collect();
    if !duplicates.is_empty() {
        log::warn!(
            "Found {} folders named '{}', consolidating into {}",
            duplicates.len() + 1,
            name,
            target.id
        );
    }

    for duplicate in duplicates {
        for child in drive.list(&children_query(&duplicate.id))? {
            drive.move_file(&child.id, &target.id, Some(&duplicate.id))?;
            log::info!("Moved '{}' into folder {}", child.name, target.id);
        }

        match drive.delete(&duplicate.id) {
            Ok(()) => log::info!("Deleted empty folder '{}' ({})", duplicate.name, duplicate.id),
            Err(e) => log::warn!(
                "Could not delete folder '{}' ({}): {}",
                duplicate.name,
                duplicate.id,
                e
            ),
        }
    }

    drive.get(&target.id)
}
