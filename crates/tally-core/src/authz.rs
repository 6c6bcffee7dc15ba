//! Authorization checks shared by every moderation path.

use crate::{Error, Result, initiative::Initiative, user::User};

pub fn is_owner_or_admin(user: &User, initiative: &Initiative) -> bool {
  user.is_admin || initiative.author_id == user.user_id
}

pub fn ensure_owner_or_admin(user: &User, initiative: &Initiative) -> Result<()> {
  if is_owner_or_admin(user, initiative) {
    Ok(())
  } else {
    Err(Error::Forbidden(user.user_id))
  }
}

pub fn ensure_admin(user: &User) -> Result<()> {
  if user.is_admin { Ok(()) } else { Err(Error::Forbidden(user.user_id)) }
}
