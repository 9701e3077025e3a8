//! Workspace folders and resource-to-folder resolution

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// A root folder of a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFolder {
    pub uri: Resource,
    pub name: String,
    pub index: usize,
}

impl WorkspaceFolder {
    pub fn new(uri: impl Into<Resource>, index: usize) -> Self {
        let uri = uri.into();
        let name = uri.file_name().unwrap_or(uri.as_str()).to_string();
        Self { uri, name, index }
    }
}

/// The set of folders a resource can belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    folders: Vec<WorkspaceFolder>,
}

impl Workspace {
    pub fn new(folders: Vec<WorkspaceFolder>) -> Self {
        Self { folders }
    }

    /// Build a workspace from folder locations, indexed in order.
    pub fn from_folders<I, R>(folders: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Resource>,
    {
        Self {
            folders: folders
                .into_iter()
                .enumerate()
                .map(|(index, uri)| WorkspaceFolder::new(uri, index))
                .collect(),
        }
    }

    pub fn folders(&self) -> &[WorkspaceFolder] {
        &self.folders
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Find the folder containing `resource`.
    ///
    /// With nested folders the innermost one wins.
    pub fn get_folder(&self, resource: &Resource) -> Option<&WorkspaceFolder> {
        self.folders
            .iter()
            .filter(|folder| folder.uri.is_equal_or_parent(resource))
            .max_by_key(|folder| folder.uri.as_str().len())
    }
}
