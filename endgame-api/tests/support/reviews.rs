use serde_json::{Value, json};

/// An `admission.k8s.io/v1` review for deleting `namespace/name` of `resource`.
pub fn review_for(resource: &str, namespace: &str, name: &str, uid: &str) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": uid,
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": resource},
            "name": name,
            "namespace": namespace,
            "operation": "DELETE",
            "userInfo": {
                "username": "system:serviceaccount:kube-system:statefulset-controller",
                "groups": ["system:serviceaccounts"]
            },
            "object": null,
            "oldObject": {"apiVersion": "v1", "kind": "Pod", "metadata": {"name": name}},
            "dryRun": false
        }
    })
}

/// A pod deletion review in namespace `storage`.
pub fn pod_delete_review(name: &str) -> Value {
    review_for("pods", "storage", name, "0df28fbd-5f5f-11e8-bc74-36e6bb280816")
}

pub fn response_allowed(review: &Value) -> bool {
    review["response"]["allowed"]
        .as_bool()
        .expect("response.allowed must be a boolean")
}

pub fn response_message(review: &Value) -> &str {
    review["response"]["status"]["message"]
        .as_str()
        .expect("response.status.message must be a string")
}
