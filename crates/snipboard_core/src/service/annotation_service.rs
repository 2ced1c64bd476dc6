//! Comment and highlight use-case service.
//!
//! # Invariants
//! - Comment text is trimmed and never blank.
//! - Highlights are written in one transaction per call.

use crate::model::annotation::{Comment, CommentId, Highlight, HighlightId, NewHighlight};
use crate::model::node::NodeId;
use crate::model::ValidationError;
use crate::repo::comment_repo::CommentRepository;
use crate::repo::highlight_repo::HighlightRepository;
use crate::repo::RepoError;
use log::info;
use std::slice;
use thiserror::Error;

/// Service error for annotation use-cases.
#[derive(Debug, Error)]
pub enum AnnotationServiceError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("comment not found: {0}")]
    CommentNotFound(CommentId),
    #[error("highlight not found: {0}")]
    HighlightNotFound(HighlightId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repo(RepoError),
    /// Write succeeded but read-back returned an unexpected shape.
    #[error("inconsistent annotation state: {0}")]
    InconsistentState(&'static str),
}

impl From<RepoError> for AnnotationServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "node", id } => Self::NodeNotFound(id),
            RepoError::NotFound {
                entity: "comment",
                id,
            } => Self::CommentNotFound(id),
            RepoError::NotFound {
                entity: "highlight",
                id,
            } => Self::HighlightNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type AnnotationServiceResult<T> = Result<T, AnnotationServiceError>;

/// Annotation service facade over repository implementations.
pub struct AnnotationService<C: CommentRepository, H: HighlightRepository> {
    comments: C,
    highlights: H,
}

impl<C: CommentRepository, H: HighlightRepository> AnnotationService<C, H> {
    pub fn new(comments: C, highlights: H) -> Self {
        Self {
            comments,
            highlights,
        }
    }

    pub fn add_comment(&self, node_id: NodeId, text: &str) -> AnnotationServiceResult<Comment> {
        let comment = self.comments.create_comment(node_id, text.trim())?;
        info!(
            "event=comment_add module=service status=ok node_id={node_id} comment_id={}",
            comment.id
        );
        Ok(comment)
    }

    /// Replaces comment text and stamps `edited_at`.
    pub fn edit_comment(
        &self,
        comment_id: CommentId,
        text: &str,
    ) -> AnnotationServiceResult<Comment> {
        Ok(self.comments.edit_comment(comment_id, text.trim())?)
    }

    pub fn delete_comment(&self, comment_id: CommentId) -> AnnotationServiceResult<()> {
        Ok(self.comments.delete_comment(comment_id)?)
    }

    /// Lists a node's comments in creation order.
    pub fn comments_for_node(&self, node_id: NodeId) -> AnnotationServiceResult<Vec<Comment>> {
        Ok(self.comments.list_comments(node_id)?)
    }

    pub fn add_highlight(&self, draft: &NewHighlight) -> AnnotationServiceResult<Highlight> {
        self.add_highlights(slice::from_ref(draft))?
            .pop()
            .ok_or(AnnotationServiceError::InconsistentState(
                "created highlight not found in read-back",
            ))
    }

    /// Stores all drafts or none of them.
    pub fn add_highlights(
        &self,
        drafts: &[NewHighlight],
    ) -> AnnotationServiceResult<Vec<Highlight>> {
        let created = self.highlights.create_highlights(drafts)?;
        info!(
            "event=highlight_add module=service status=ok count={}",
            created.len()
        );
        Ok(created)
    }

    /// Lists highlights drawn on one document page, across all nodes.
    pub fn highlights_for_page(
        &self,
        document_path: &str,
        page_index: u32,
    ) -> AnnotationServiceResult<Vec<Highlight>> {
        Ok(self
            .highlights
            .list_highlights_for_page(document_path, page_index)?)
    }

    pub fn highlights_for_node(&self, node_id: NodeId) -> AnnotationServiceResult<Vec<Highlight>> {
        Ok(self.highlights.list_highlights_for_node(node_id)?)
    }

    pub fn delete_highlight(&self, highlight_id: HighlightId) -> AnnotationServiceResult<()> {
        Ok(self.highlights.delete_highlight(highlight_id)?)
    }
}
