//! Folders and tags.

use crate::error::{HistoryError, Result};
use crate::store::HistoryStore;
use chatvault_core::{
    Folder, FolderId, OwnerId, Tag, TagId, DEFAULT_FOLDER_COLOR, DEFAULT_TAG_COLOR,
};
use chrono::Utc;
use std::collections::BTreeSet;

/// Partial update of a folder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderUpdate {
    pub name: Option<String>,
    /// `Some(None)` moves the folder to the top level.
    pub parent_id: Option<Option<FolderId>>,
    pub color: Option<String>,
}

/// Partial update of a tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

fn required_name(name: &str, kind: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HistoryError::Invalid(format!("{} name is required", kind)));
    }
    Ok(name.to_string())
}

impl HistoryStore {
    /// Create a folder, optionally nested under a parent.
    pub async fn create_folder(
        &self,
        owner: &OwnerId,
        name: &str,
        parent_id: Option<FolderId>,
        color: Option<String>,
    ) -> Result<Folder> {
        let name = required_name(name, "Folder")?;
        self.mutate(|state| {
            if let Some(parent) = parent_id {
                state.folder(owner, parent)?;
            }
            let now = Utc::now();
            let folder = Folder {
                id: state.next_folder_id(),
                owner: owner.clone(),
                name,
                parent_id,
                color: color.unwrap_or_else(|| DEFAULT_FOLDER_COLOR.to_string()),
                created_at: now,
                updated_at: now,
            };
            state.folders.insert(folder.id, folder.clone());
            Ok(folder)
        })
        .await
    }

    /// Folders owned by `owner`, in creation order.
    pub async fn list_folders(&self, owner: &OwnerId) -> Result<Vec<Folder>> {
        self.read(|state| {
            Ok(state
                .folders
                .values()
                .filter(|f| &f.owner == owner)
                .cloned()
                .collect())
        })
        .await
    }

    pub async fn update_folder(
        &self,
        owner: &OwnerId,
        id: FolderId,
        update: FolderUpdate,
    ) -> Result<Folder> {
        let name = update
            .name
            .as_deref()
            .map(|n| required_name(n, "Folder"))
            .transpose()?;

        self.mutate(|state| {
            state.folder(owner, id)?;
            if let Some(Some(parent)) = update.parent_id {
                state.folder(owner, parent)?;
                // Walk up from the new parent; reaching `id` means a cycle
                let mut cursor = Some(parent);
                while let Some(current) = cursor {
                    if current == id {
                        return Err(HistoryError::Invalid(
                            "A folder cannot be moved inside itself".to_string(),
                        ));
                    }
                    cursor = state.folders.get(&current).and_then(|f| f.parent_id);
                }
            }

            let folder = state
                .folders
                .get_mut(&id)
                .ok_or_else(|| HistoryError::not_found("Folder", id))?;
            if let Some(name) = name {
                folder.name = name;
            }
            if let Some(parent) = update.parent_id {
                folder.parent_id = parent;
            }
            if let Some(color) = update.color {
                folder.color = color;
            }
            folder.updated_at = Utc::now();
            Ok(folder.clone())
        })
        .await
    }

    /// Delete a folder and its sub-folders.
    ///
    /// Conversations filed under any removed folder are kept but lose their folder.
    pub async fn delete_folder(&self, owner: &OwnerId, id: FolderId) -> Result<usize> {
        self.mutate(|state| {
            state.folder(owner, id)?;

            let mut doomed = BTreeSet::from([id]);
            loop {
                let children: Vec<FolderId> = state
                    .folders
                    .values()
                    .filter(|f| f.parent_id.is_some_and(|p| doomed.contains(&p)))
                    .map(|f| f.id)
                    .filter(|f| !doomed.contains(f))
                    .collect();
                if children.is_empty() {
                    break;
                }
                doomed.extend(children);
            }

            for folder in &doomed {
                state.folders.remove(folder);
            }
            for conversation in state.conversations.values_mut() {
                if conversation.folder_id.is_some_and(|f| doomed.contains(&f)) {
                    conversation.folder_id = None;
                }
            }
            Ok(doomed.len())
        })
        .await
    }

    /// Create a tag. Creating an existing name returns the existing tag.
    pub async fn create_tag(
        &self,
        owner: &OwnerId,
        name: &str,
        color: Option<String>,
    ) -> Result<Tag> {
        let name = required_name(name, "Tag")?;
        self.mutate(|state| {
            if let Some(existing) = state
                .tags
                .values()
                .find(|t| &t.owner == owner && t.name == name)
            {
                return Ok(existing.clone());
            }
            let tag = Tag {
                id: state.next_tag_id(),
                owner: owner.clone(),
                name,
                color: color.unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
                created_at: Utc::now(),
            };
            state.tags.insert(tag.id, tag.clone());
            Ok(tag)
        })
        .await
    }

    /// Tags owned by `owner`, in creation order.
    pub async fn list_tags(&self, owner: &OwnerId) -> Result<Vec<Tag>> {
        self.read(|state| {
            Ok(state
                .tags
                .values()
                .filter(|t| &t.owner == owner)
                .cloned()
                .collect())
        })
        .await
    }

    pub async fn update_tag(&self, owner: &OwnerId, id: TagId, update: TagUpdate) -> Result<Tag> {
        let name = update
            .name
            .as_deref()
            .map(|n| required_name(n, "Tag"))
            .transpose()?;

        self.mutate(|state| {
            state.tag(owner, id)?;
            if let Some(name) = &name {
                let taken = state
                    .tags
                    .values()
                    .any(|t| &t.owner == owner && t.id != id && &t.name == name);
                if taken {
                    return Err(HistoryError::Conflict(format!("Tag '{}' already exists", name)));
                }
            }

            let tag = state
                .tags
                .get_mut(&id)
                .ok_or_else(|| HistoryError::not_found("Tag", id))?;
            if let Some(name) = name {
                tag.name = name;
            }
            if let Some(color) = update.color {
                tag.color = color;
            }
            Ok(tag.clone())
        })
        .await
    }

    /// Delete a tag and detach it from every conversation.
    pub async fn delete_tag(&self, owner: &OwnerId, id: TagId) -> Result<()> {
        self.mutate(|state| {
            state.tag(owner, id)?;
            state.tags.remove(&id);
            for conversation in state.conversations.values_mut() {
                conversation.tag_ids.retain(|t| *t != id);
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConversationUpdate, NewConversation};
    use chatvault_core::Platform;

    fn owner() -> OwnerId {
        OwnerId::new("alice")
    }

    #[tokio::test]
    async fn test_folder_defaults() {
        let store = HistoryStore::in_memory();
        let folder = store.create_folder(&owner(), "  Work  ", None, None).await.unwrap();
        assert_eq!(folder.name, "Work");
        assert_eq!(folder.color, "#667eea");

        let err = store.create_folder(&owner(), " ", None, None).await.unwrap_err();
        assert!(matches!(err, HistoryError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_folder_cycle_rejected() {
        let store = HistoryStore::in_memory();
        let root = store.create_folder(&owner(), "root", None, None).await.unwrap();
        let child = store.create_folder(&owner(), "child", Some(root.id), None).await.unwrap();

        let err = store
            .update_folder(
                &owner(),
                root.id,
                FolderUpdate {
                    parent_id: Some(Some(child.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::Invalid(_)));

        let moved = store
            .update_folder(
                &owner(),
                child.id,
                FolderUpdate {
                    parent_id: Some(None),
                    color: Some("#000000".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(moved.parent_id.is_none());
        assert_eq!(moved.color, "#000000");
    }

    #[tokio::test]
    async fn test_delete_folder_cascades() {
        let store = HistoryStore::in_memory();
        let root = store.create_folder(&owner(), "root", None, None).await.unwrap();
        let child = store.create_folder(&owner(), "child", Some(root.id), None).await.unwrap();
        let _grandchild = store.create_folder(&owner(), "gc", Some(child.id), None).await.unwrap();
        let other = store.create_folder(&owner(), "other", None, None).await.unwrap();

        let conv = store
            .create_conversation(
                &owner(),
                NewConversation::new(Platform::OpenAI, "gpt-4").in_folder(Some(child.id)),
            )
            .await
            .unwrap();

        let removed = store.delete_folder(&owner(), root.id).await.unwrap();
        assert_eq!(removed, 3);

        let folders = store.list_folders(&owner()).await.unwrap();
        assert_eq!(folders, vec![other]);

        let conv = store.get_conversation(&owner(), conv.id).await.unwrap();
        assert!(conv.folder_id.is_none());
    }

    #[tokio::test]
    async fn test_create_tag_is_idempotent() {
        let store = HistoryStore::in_memory();
        let first = store.create_tag(&owner(), "rust", Some("#ff0000".to_string())).await.unwrap();
        let again = store.create_tag(&owner(), "rust", None).await.unwrap();
        assert_eq!(first, again);
        assert_eq!(store.list_tags(&owner()).await.unwrap().len(), 1);

        let other_owner = store.create_tag(&OwnerId::new("bob"), "rust", None).await.unwrap();
        assert_ne!(other_owner.id, first.id);
        assert_eq!(other_owner.color, "#6c757d");
    }

    #[tokio::test]
    async fn test_rename_tag_conflict() {
        let store = HistoryStore::in_memory();
        let _a = store.create_tag(&owner(), "a", None).await.unwrap();
        let b = store.create_tag(&owner(), "b", None).await.unwrap();

        let err = store
            .update_tag(
                &owner(),
                b.id,
                TagUpdate {
                    name: Some("a".to_string()),
                    color: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_tag_detaches() {
        let store = HistoryStore::in_memory();
        let tag = store.create_tag(&owner(), "temp", None).await.unwrap();
        let conv = store
            .create_conversation(&owner(), NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();
        store
            .update_conversation(
                &owner(),
                conv.id,
                ConversationUpdate {
                    tag_ids: Some(vec![tag.id]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        store.delete_tag(&owner(), tag.id).await.unwrap();
        let conv = store.get_conversation(&owner(), conv.id).await.unwrap();
        assert!(conv.tag_ids.is_empty());
    }
}
