use thiserror::Error;

use crate::recognition::domain::response::{
    ClassificationResponse, Face, FaceDetectionResponse, FaceGender,
};
use crate::shared::error::ApplicationError;
use crate::shared::tag::Tag;

/// The service answered but sent no result body at all.
///
/// Distinct from a successful response that happens to contain zero results.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("the service returned no data")]
pub struct EmptyResult;

impl From<EmptyResult> for ApplicationError {
    fn from(_: EmptyResult) -> Self {
        ApplicationError::EmptyResult
    }
}

/// Flattens every class of every classifier of every image into tags, in
/// document order. Labels are upper-cased; nothing is sorted or filtered.
/// Entries missing a name or a score are skipped.
pub fn classify_to_tags(
    response: Option<&ClassificationResponse>,
) -> Result<Vec<Tag>, EmptyResult> {
    let response = response.ok_or(EmptyResult)?;

    let tags = response
        .images
        .iter()
        .flat_map(|image| &image.classifiers)
        .flat_map(|classifier| &classifier.classes)
        .filter_map(|class| {
            let name = class.class_name.as_deref()?;
            let score = class.score?;
            Some(Tag::new(name.to_uppercase(), score))
        })
        .collect();

    Ok(tags)
}

/// Maps each detected face to a gender/age tag followed by an optional
/// identity tag. Face order is preserved.
pub fn detect_faces_to_tags(
    response: Option<&FaceDetectionResponse>,
) -> Result<Vec<Tag>, EmptyResult> {
    let response = response.ok_or(EmptyResult)?;

    let mut tags = Vec::new();
    for face in response.images.iter().flat_map(|image| &image.faces) {
        if let Some(tag) = gender_age_tag(face) {
            tags.push(tag);
        }
        if let Some(tag) = identity_tag(face) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

fn gender_age_tag(face: &Face) -> Option<Tag> {
    let gender = face.gender.as_ref()?;
    let label = gender_label(gender)?;
    let gender_score = gender.score?;

    let age = face.age.as_ref();
    let min = age.and_then(|a| a.min);
    let max = age.and_then(|a| a.max);
    let age_score = age.and_then(|a| a.score);

    let tag = match (min, max, age_score) {
        (Some(min), Some(max), Some(age_score)) => {
            Tag::with_secondary(format!("{label} ({min}-{max})"), gender_score, age_score)
        }
        (Some(min), None, Some(age_score)) => {
            Tag::with_secondary(format!("{label} ({min}-?)"), gender_score, age_score)
        }
        // Known defect, kept for output compatibility: no closing parenthesis.
        (None, Some(max), Some(age_score)) => {
            Tag::with_secondary(format!("{label} (?-{max}"), gender_score, age_score)
        }
        _ => Tag::new(label, gender_score),
    };
    Some(tag)
}

fn gender_label(gender: &FaceGender) -> Option<String> {
    gender
        .gender
        .clone()
        .or_else(|| gender.gender_label.as_deref().map(str::to_uppercase))
}

fn identity_tag(face: &Face) -> Option<Tag> {
    let identity = face.identity.as_ref()?;
    let name = identity.name.as_deref()?;
    let score = identity.score?;
    Some(Tag::new(name, score))
}
