/// Separator between the member id and the member attributes in a
/// `member list` line.
const HANDLE_SEPARATOR: char = ':';

/// Separator inside a URL list attribute.
const URL_LIST_SEPARATOR: char = ',';

/// One entry of the etcd membership list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterMember {
    /// Hex member id, the handle `member remove` expects.
    pub id: String,
    /// Member name. For a StatefulSet backed cluster it equals the pod name.
    pub name: String,
    pub peer_urls: Vec<String>,
    pub client_urls: Vec<String>,
    pub is_leader: bool,
}

/// The members reported by a single `member list` call, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSnapshot {
    members: Vec<ClusterMember>,
}

impl MembershipSnapshot {
    pub fn new(members: Vec<ClusterMember>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[ClusterMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the first member registered under `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&ClusterMember> {
        self.members.iter().find(|member| member.name == name)
    }
}

/// Parses the output of `etcdctl member list`.
///
/// Expected lines look like:
///
/// ```text
/// b429c86e3cd4e077: name=etcd-2 peerURLs=http://etcd-2.etcd:2380 clientURLs=http://etcd-2.etcd:2379 isLeader=false
/// ```
///
/// Lines that do not have this shape are skipped. The output format belongs to
/// etcd, so garbage in it must only make a member invisible, never abort the
/// whole listing.
pub fn parse_member_list<I, S>(lines: I) -> MembershipSnapshot
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let members = lines
        .into_iter()
        .filter_map(|line| parse_member_line(line.as_ref()))
        .collect();

    MembershipSnapshot::new(members)
}

fn parse_member_line(line: &str) -> Option<ClusterMember> {
    let (handle, attributes) = line.trim().split_once(HANDLE_SEPARATOR)?;
    if handle.is_empty() || handle.contains(char::is_whitespace) {
        return None;
    }

    let mut name = None;
    let mut peer_urls = Vec::new();
    let mut client_urls = Vec::new();
    let mut is_leader = false;

    for token in attributes.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };

        match key {
            "name" => name = Some(value.to_string()),
            "peerURLs" => peer_urls = split_urls(value),
            "clientURLs" => client_urls = split_urls(value),
            "isLeader" => is_leader = value == "true",
            _ => {}
        }
    }

    // A member that has been added but not started yet has an empty name, it
    // cannot belong to any pod.
    let name = name.filter(|name| !name.is_empty())?;

    Some(ClusterMember {
        id: handle.to_string(),
        name,
        peer_urls,
        client_urls,
        is_leader,
    })
}

fn split_urls(value: &str) -> Vec<String> {
    value
        .split(URL_LIST_SEPARATOR)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}
